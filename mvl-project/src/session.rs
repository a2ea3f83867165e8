use crate::{Error, ObservationTable, Result};
use log::debug;
use mvl_core::{nalgebra::Point3, NormalizedPixel, ProjectionMatrix, TriangulatorAnchored};
use std::collections::BTreeSet;

/// What an annotation action did, for the display layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationOutcome {
    /// Fewer than two views were labeled, or the geometry was degenerate:
    /// only the raw click was stored, and no other view was touched.
    SingleView { view: usize, pixel: NormalizedPixel },
    /// Triangulation succeeded: every view received a reprojection of the 3d
    /// point, with the clicked view keeping the click exactly.
    Triangulated {
        point: Point3<f64>,
        reprojections: Vec<NormalizedPixel>,
    },
}

/// A multi-view annotation session: the view and joint lists, the committed
/// projection matrices, the observation table, and the triangulation engine,
/// together with the image/joint cursors the annotator moves around.
///
/// Each click runs one full triangulate-and-reproject cycle before
/// returning; no state is carried between clicks beyond the table itself.
#[derive(Debug, Clone)]
pub struct AnnotationSession<T> {
    views: Vec<String>,
    joints: Vec<String>,
    matrices: Vec<ProjectionMatrix>,
    table: ObservationTable,
    triangulator: T,
    image_cursor: usize,
    joint_cursor: usize,
    displaying: BTreeSet<usize>,
}

impl<T: TriangulatorAnchored> AnnotationSession<T> {
    /// Builds a session over validated project state. The matrices must have
    /// been committed through the matrix entry session or project
    /// configuration, so an all-zero matrix here is refused.
    pub fn new(
        views: Vec<String>,
        joints: Vec<String>,
        matrices: Vec<ProjectionMatrix>,
        table: ObservationTable,
        triangulator: T,
    ) -> Result<Self> {
        if views.len() < 2 {
            return Err(Error::TooFewViews(views.len()));
        }
        if joints.is_empty() {
            return Err(Error::NoJoints);
        }
        if matrices.len() != views.len() {
            return Err(Error::MissingMatrices);
        }
        for (view, matrix) in views.iter().zip(&matrices) {
            if matrix.is_zero() {
                return Err(Error::ZeroMatrix(view.clone()));
            }
        }
        if table.views() != views.len() || table.joints() != joints.len() {
            return Err(Error::MismatchedTable {
                views: views.len(),
                joints: joints.len(),
            });
        }
        let displaying = (0..joints.len()).collect();
        Ok(Self {
            views,
            joints,
            matrices,
            table,
            triangulator,
            image_cursor: 0,
            joint_cursor: 0,
            displaying,
        })
    }

    pub fn views(&self) -> &[String] {
        &self.views
    }

    pub fn joints(&self) -> &[String] {
        &self.joints
    }

    pub fn matrices(&self) -> &[ProjectionMatrix] {
        &self.matrices
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ObservationTable {
        &mut self.table
    }

    /// Annotates one joint in one view of one image and reconciles the other
    /// views.
    ///
    /// With at least two views labeled (counting this click), the joint is
    /// triangulated anchored at the clicked view and every view receives a
    /// reprojection, the clicked view keeping the click exactly. With fewer,
    /// or when the geometry is degenerate, only the raw click is stored and
    /// no other view changes.
    pub fn annotate(
        &mut self,
        image: &str,
        joint: usize,
        view: usize,
        pixel: NormalizedPixel,
    ) -> Result<AnnotationOutcome> {
        if view >= self.views.len() {
            return Err(Error::UnknownView(view));
        }
        let mut labeled = self.table.labeled_views(image, joint)?;
        let anchor = match labeled.iter().position(|&(v, _)| v == view) {
            Some(ix) => {
                labeled[ix].1 = pixel;
                ix
            }
            None => {
                let ix = labeled.iter().take_while(|&&(v, _)| v < view).count();
                labeled.insert(ix, (view, pixel));
                ix
            }
        };

        if labeled.len() >= 2 {
            if let Some((point, mut reprojections)) = self.reconcile(&labeled, anchor) {
                reprojections[view] = pixel;
                self.table.set_all(image, joint, &reprojections)?;
                debug!(
                    "triangulated {:?} on {:?} from {} views to {}",
                    self.joints[joint],
                    image,
                    labeled.len(),
                    point
                );
                return Ok(AnnotationOutcome::Triangulated {
                    point,
                    reprojections,
                });
            }
            debug!(
                "degenerate triangulation for {:?} on {:?}; keeping the raw click",
                self.joints[joint], image
            );
        }
        self.table.set(view, image, joint, pixel)?;
        Ok(AnnotationOutcome::SingleView { view, pixel })
    }

    /// Triangulates the labeled observations and reprojects into every view,
    /// or `None` on any degeneracy along the way.
    fn reconcile(
        &self,
        labeled: &[(usize, NormalizedPixel)],
        anchor: usize,
    ) -> Option<(Point3<f64>, Vec<NormalizedPixel>)> {
        let observations = labeled.iter().map(|&(view, pixel)| (self.matrices[view], pixel));
        let estimate = self
            .triangulator
            .triangulate_anchored(observations, anchor)?;
        let point = estimate.point()?;
        let reprojections = self
            .matrices
            .iter()
            .map(|matrix| matrix.project(estimate))
            .collect::<Option<Vec<_>>>()?;
        Some((point, reprojections))
    }

    /// Removes the joint's annotation in one view only. Other views keep
    /// whatever they have, including reprojections a previous click wrote.
    pub fn remove(&mut self, image: &str, joint: usize, view: usize) -> Result<()> {
        self.table.clear(view, image, joint)
    }

    /// The triangulated position of a joint on an image, if at least two
    /// views are labeled and the geometry permits; anchored at the first
    /// labeled view. Purely a query, nothing is written.
    pub fn estimate(&self, image: &str, joint: usize) -> Result<Option<Point3<f64>>> {
        let labeled = self.table.labeled_views(image, joint)?;
        if labeled.len() < 2 {
            return Ok(None);
        }
        Ok(self.reconcile(&labeled, 0).map(|(point, _)| point))
    }

    pub fn current_image(&self) -> Option<&str> {
        self.table.images().nth(self.image_cursor)
    }

    pub fn image_cursor(&self) -> usize {
        self.image_cursor
    }

    /// Moves the image cursor, wrapping past either end.
    pub fn set_image(&mut self, index: usize) {
        let count = self.table.image_count();
        if count > 0 {
            self.image_cursor = index % count;
        }
    }

    pub fn next_image(&mut self) {
        self.set_image(self.image_cursor + 1);
    }

    pub fn prev_image(&mut self) {
        let count = self.table.image_count();
        if count > 0 {
            self.set_image(self.image_cursor + count - 1);
        }
    }

    pub fn current_joint(&self) -> usize {
        self.joint_cursor
    }

    /// Selects the labeling joint. Only displayed joints can be selected;
    /// returns whether the selection took effect.
    pub fn set_joint(&mut self, joint: usize) -> Result<bool> {
        if joint >= self.joints.len() {
            return Err(Error::UnknownJoint(joint));
        }
        if !self.displaying.contains(&joint) {
            return Ok(false);
        }
        self.joint_cursor = joint;
        Ok(true)
    }

    /// Cycles the labeling joint to the next displayed one.
    pub fn next_joint(&mut self) {
        let mut joint = (self.joint_cursor + 1) % self.joints.len();
        while !self.displaying.contains(&joint) {
            joint = (joint + 1) % self.joints.len();
        }
        self.joint_cursor = joint;
    }

    pub fn displaying(&self) -> impl Iterator<Item = usize> + '_ {
        self.displaying.iter().copied()
    }

    pub fn is_displayed(&self, joint: usize) -> bool {
        self.displaying.contains(&joint)
    }

    /// Shows or hides a joint's annotations. The last displayed joint cannot
    /// be hidden; hiding the joint currently being labeled moves the cursor
    /// to the first joint still displayed. Returns whether the change took
    /// effect.
    pub fn set_displayed(&mut self, joint: usize, displayed: bool) -> Result<bool> {
        if joint >= self.joints.len() {
            return Err(Error::UnknownJoint(joint));
        }
        if displayed {
            self.displaying.insert(joint);
            return Ok(true);
        }
        if self.displaying.len() == 1 && self.displaying.contains(&joint) {
            return Ok(false);
        }
        self.displaying.remove(&joint);
        if self.joint_cursor == joint {
            if let Some(&first) = self.displaying.iter().next() {
                self.joint_cursor = first;
            }
        }
        Ok(true)
    }

    fn displayed_joints(&self) -> Vec<usize> {
        self.displaying.iter().copied().collect()
    }

    /// Jumps to the next image where any displayed joint is missing in some
    /// view. Returns the new cursor, or `None` (cursor unchanged) when no
    /// image qualifies.
    pub fn skip_missing_any(&mut self) -> Option<usize> {
        let next = self
            .table
            .next_missing_any(self.image_cursor, &self.displayed_joints())?;
        self.image_cursor = next;
        Some(next)
    }

    /// Jumps to the next image where every displayed joint is missing.
    pub fn skip_missing_all(&mut self) -> Option<usize> {
        let next = self
            .table
            .next_missing_all(self.image_cursor, &self.displayed_joints())?;
        self.image_cursor = next;
        Some(next)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SyncReport;
    use mvl_geom::AnchoredDltTriangulator;

    fn session() -> AnnotationSession<AnchoredDltTriangulator> {
        let views = vec!["left".to_string(), "right".to_string()];
        let joints = vec!["head".to_string(), "tail".to_string(), "hip".to_string()];
        let matrices = vec![
            ProjectionMatrix::from_rows([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 1.0],
            ]),
            ProjectionMatrix::from_rows([
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 1.0],
            ]),
        ];
        let mut table = ObservationTable::new(2, 3);
        table.apply_sync(&SyncReport {
            added: vec!["a.png".to_string(), "b.png".to_string()],
            removed: vec![],
        });
        AnnotationSession::new(views, joints, matrices, table, AnchoredDltTriangulator::new())
            .unwrap()
    }

    #[test]
    fn zero_matrices_are_refused() {
        let views = vec!["left".to_string(), "right".to_string()];
        let joints = vec!["head".to_string()];
        let matrices = vec![
            ProjectionMatrix::from_rows([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 1.0],
            ]),
            ProjectionMatrix::zeros(),
        ];
        let table = ObservationTable::new(2, 1);
        assert!(matches!(
            AnnotationSession::new(
                views,
                joints,
                matrices,
                table,
                AnchoredDltTriangulator::new()
            ),
            Err(Error::ZeroMatrix(view)) if view == "right"
        ));
    }

    #[test]
    fn image_cursor_wraps() {
        let mut session = session();
        assert_eq!(session.current_image(), Some("a.png"));
        session.next_image();
        assert_eq!(session.current_image(), Some("b.png"));
        session.next_image();
        assert_eq!(session.current_image(), Some("a.png"));
        session.prev_image();
        assert_eq!(session.current_image(), Some("b.png"));
    }

    #[test]
    fn hiding_the_active_joint_moves_the_cursor() {
        let mut session = session();
        assert!(session.set_joint(1).unwrap());
        assert!(session.set_displayed(1, false).unwrap());
        assert_eq!(session.current_joint(), 0);
        // A hidden joint cannot be selected for labeling.
        assert!(!session.set_joint(1).unwrap());
        // Cycling skips it too.
        session.next_joint();
        assert_eq!(session.current_joint(), 2);
        session.next_joint();
        assert_eq!(session.current_joint(), 0);
    }

    #[test]
    fn the_last_displayed_joint_stays() {
        let mut session = session();
        assert!(session.set_displayed(0, false).unwrap());
        assert!(session.set_displayed(1, false).unwrap());
        assert!(!session.set_displayed(2, false).unwrap());
        assert!(session.is_displayed(2));
    }

    #[test]
    fn skip_scans_move_the_cursor() {
        let mut session = session();
        let pixels = [
            NormalizedPixel::new(0.1, 0.1),
            NormalizedPixel::new(0.2, 0.2),
        ];
        for joint in 0..3 {
            session.table_mut().set_all("a.png", joint, &pixels).unwrap();
        }
        assert_eq!(session.skip_missing_any(), Some(1));
        assert_eq!(session.current_image(), Some("b.png"));
        // Every joint on b.png is still unlabeled, so missing-all finds it
        // again from itself (wrapping the whole way around).
        assert_eq!(session.skip_missing_all(), Some(1));
    }
}
