use crate::{Error, Result};
use mvl_core::{nalgebra::Matrix3x4, ProjectionMatrix};

/// The sequential projection-matrix entry session.
///
/// One committed 3x4 matrix is held per view, zero until edited. The selected
/// view's matrix is edited as twelve text cells, the way the entry dialog
/// presents it; [`MatrixEntrySession::advance`] and
/// [`MatrixEntrySession::revert`] first try to commit the staged text and
/// only then move the selector circularly through the views. A staged cell
/// that does not parse as a finite real number aborts the transition and the
/// selector stays put, so a half-edited matrix can never be skipped past.
///
/// [`MatrixEntrySession::finish`] is the terminal gate: it refuses to hand
/// the matrices to the caller while any view's matrix is still all zero.
/// Cancelling the session is simply dropping it; nothing is committed
/// anywhere else.
#[derive(Debug, Clone)]
pub struct MatrixEntrySession {
    views: Vec<String>,
    matrices: Vec<Matrix3x4<f64>>,
    selected: usize,
    staged: Vec<Vec<String>>,
}

fn parse_cell(row: usize, col: usize, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| Error::MalformedEntry {
            row,
            col,
            text: text.to_string(),
        })
}

impl MatrixEntrySession {
    /// Starts a session over the given views with all matrices zero.
    pub fn new(views: Vec<String>) -> Result<Self> {
        if views.len() < 2 {
            return Err(Error::TooFewViews(views.len()));
        }
        let matrices = vec![Matrix3x4::zeros(); views.len()];
        let mut session = Self {
            views,
            matrices,
            selected: 0,
            staged: Vec::new(),
        };
        session.restage();
        Ok(session)
    }

    /// Starts a session pre-filled with previously committed matrices, for
    /// re-editing a configured project.
    pub fn with_matrices(views: Vec<String>, matrices: Vec<ProjectionMatrix>) -> Result<Self> {
        let mut session = Self::new(views)?;
        if matrices.len() != session.views.len() {
            return Err(Error::MissingMatrices);
        }
        session.matrices = matrices.into_iter().map(|m| m.0).collect();
        session.restage();
        Ok(session)
    }

    fn restage(&mut self) {
        let matrix = &self.matrices[self.selected];
        self.staged = (0..3)
            .map(|row| (0..4).map(|col| format!("{}", matrix[(row, col)])).collect())
            .collect();
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn selected_view(&self) -> usize {
        self.selected
    }

    pub fn view_name(&self) -> &str {
        &self.views[self.selected]
    }

    /// The committed matrix for a view; zero until edited.
    pub fn matrix(&self, view: usize) -> Result<ProjectionMatrix> {
        self.matrices
            .get(view)
            .map(|&m| ProjectionMatrix(m))
            .ok_or(Error::UnknownView(view))
    }

    /// Commits a matrix for a view directly. Non-finite entries are rejected;
    /// the previous value stays in place.
    pub fn set_matrix(&mut self, view: usize, matrix: ProjectionMatrix) -> Result<()> {
        if view >= self.views.len() {
            return Err(Error::UnknownView(view));
        }
        if !matrix.0.iter().all(|entry| entry.is_finite()) {
            return Err(Error::NonFiniteMatrix(self.views[view].clone()));
        }
        self.matrices[view] = matrix.0;
        if view == self.selected {
            self.restage();
        }
        Ok(())
    }

    /// The staged text of one cell of the selected view's matrix.
    ///
    /// Cell indices follow the 3x4 layout; out-of-range indices panic.
    pub fn staged_text(&self, row: usize, col: usize) -> &str {
        &self.staged[row][col]
    }

    /// Stages new text for one cell of the selected view's matrix.
    ///
    /// The text is staged regardless of whether it parses, so a transition
    /// attempted later still sees it; the returned result tells the caller
    /// immediately whether the cell is a finite number, and on `Err` the
    /// caller re-displays the last committed value.
    pub fn stage(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<f64> {
        let text = text.into();
        let parsed = parse_cell(row, col, &text);
        self.staged[row][col] = text;
        parsed
    }

    /// Parses the staged cells and commits them as the selected view's
    /// matrix. The first malformed cell aborts the commit and nothing is
    /// written.
    pub fn commit(&mut self) -> Result<()> {
        let mut matrix = Matrix3x4::zeros();
        for (row, cells) in self.staged.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                matrix[(row, col)] = parse_cell(row, col, text)?;
            }
        }
        self.matrices[self.selected] = matrix;
        Ok(())
    }

    /// Commits the staged edit, then moves the selector to the next view
    /// (wrapping). A malformed staged cell aborts and the selector does not
    /// move.
    pub fn advance(&mut self) -> Result<usize> {
        self.commit()?;
        self.selected = (self.selected + 1) % self.views.len();
        self.restage();
        Ok(self.selected)
    }

    /// Commits the staged edit, then moves the selector to the previous view
    /// (wrapping). A malformed staged cell aborts and the selector does not
    /// move.
    pub fn revert(&mut self) -> Result<usize> {
        self.commit()?;
        self.selected = (self.selected + self.views.len() - 1) % self.views.len();
        self.restage();
        Ok(self.selected)
    }

    /// Whether every committed matrix is non-zero. The staged edit is not
    /// considered.
    pub fn validate_all(&self) -> bool {
        self.matrices
            .iter()
            .all(|matrix| matrix.iter().any(|&entry| entry != 0.0))
    }

    /// Commits the staged edit and hands the per-view matrices to the
    /// caller, or refuses if any view's matrix is still all zero.
    pub fn finish(mut self) -> Result<Vec<ProjectionMatrix>> {
        self.commit()?;
        for (view, matrix) in self.views.iter().zip(&self.matrices) {
            if matrix.iter().all(|&entry| entry == 0.0) {
                return Err(Error::ZeroMatrix(view.clone()));
            }
        }
        Ok(self.matrices.into_iter().map(ProjectionMatrix).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn session() -> MatrixEntrySession {
        MatrixEntrySession::new(vec![
            "left".to_string(),
            "middle".to_string(),
            "right".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn advancing_view_count_times_returns_to_the_start() {
        let mut session = session();
        for _ in 0..session.view_count() {
            session.advance().unwrap();
        }
        assert_eq!(session.selected_view(), 0);
    }

    #[test]
    fn revert_undoes_one_advance() {
        let mut session = session();
        session.advance().unwrap();
        session.revert().unwrap();
        assert_eq!(session.selected_view(), 0);
        // And wraps backwards from the first view.
        session.revert().unwrap();
        assert_eq!(session.selected_view(), session.view_count() - 1);
    }

    #[test]
    fn malformed_cell_aborts_the_transition() {
        let mut session = session();
        assert!(session.stage(1, 2, "not a number").is_err());
        assert!(matches!(
            session.advance(),
            Err(Error::MalformedEntry { row: 1, col: 2, .. })
        ));
        assert_eq!(session.selected_view(), 0);
        // Fixing the cell lets the transition through.
        session.stage(1, 2, "3.5").unwrap();
        session.advance().unwrap();
        assert_eq!(session.selected_view(), 1);
        assert_eq!(session.matrix(0).unwrap().0[(1, 2)], 3.5);
    }

    #[test]
    fn infinite_text_is_malformed() {
        let mut session = session();
        assert!(session.stage(0, 0, "inf").is_err());
        assert!(session.stage(0, 0, "NaN").is_err());
        assert!(session.stage(0, 0, " -2.25 ").is_ok());
    }

    #[test]
    fn matrices_default_to_zero() {
        let session = session();
        assert!(session.matrix(0).unwrap().is_zero());
        assert!(!session.validate_all());
    }

    #[test]
    fn validate_all_needs_every_view_nonzero() {
        let mut session = session();
        let nonzero = ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
        ]);
        session.set_matrix(0, nonzero).unwrap();
        session.set_matrix(2, nonzero).unwrap();
        assert!(!session.validate_all());
        session.set_matrix(1, nonzero).unwrap();
        assert!(session.validate_all());
    }

    #[test]
    fn finish_refuses_zero_matrices() {
        let mut session = session();
        let nonzero = ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
        ]);
        session.set_matrix(0, nonzero).unwrap();
        session.set_matrix(1, nonzero).unwrap();
        assert!(matches!(
            session.clone().finish(),
            Err(Error::ZeroMatrix(view)) if view == "right"
        ));
        session.set_matrix(2, nonzero).unwrap();
        assert_eq!(session.finish().unwrap().len(), 3);
    }

    #[test]
    fn non_finite_matrices_are_rejected() {
        let mut session = session();
        let bad = ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, f64::NAN, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
        ]);
        assert!(matches!(
            session.set_matrix(1, bad),
            Err(Error::NonFiniteMatrix(view)) if view == "middle"
        ));
        assert!(session.matrix(1).unwrap().is_zero());
    }

    #[test]
    fn selecting_a_view_restages_its_committed_values() {
        let mut session = session();
        session.stage(0, 0, "7").unwrap();
        session.advance().unwrap();
        assert_eq!(session.staged_text(0, 0), "0");
        session.revert().unwrap();
        assert_eq!(session.staged_text(0, 0), "7");
    }
}
