use float_ord::FloatOrd;
use log::debug;
use mvl_core::{NormalizedPixel, ProjectionMatrix, TriangulatorAnchored, WorldEstimate};
use nalgebra::{DMatrix, DVector, Vector4};

/// Triangulates a joint from two or more views by homogeneous least squares,
/// then corrects the solution so the anchor view stays exactly consistent
/// with its observation.
///
/// Each labeled view contributes the constraint that `P·X` is parallel to its
/// homogeneous observation `(u, v, 1)`. Rather than eliminating the unknown
/// projective scales, one scale unknown per view is kept and coupled into a
/// single linear system: view `i` contributes the three rows
/// `[P_i | -(u_i, v_i, 1) in column 4+i]` over the augmented unknown vector
/// `(X, s_0, .., s_{n-1})`. Keeping the scales as unknowns stops any single
/// view's projection from pinning a noise-consistent degenerate solution, and
/// it is what makes the anchor correction possible at all: the anchor view's
/// constraint rows live in the same space as the solution vector.
///
/// The null vector of the system is taken from the right singular vector of
/// the smallest singular value (total least squares). The anchor correction
/// then removes from that vector its component in the span of the anchor
/// view's three constraint rows (orthonormalized by QR), after which the
/// anchor equations hold exactly and the anchor reprojection reproduces the
/// click. This deliberately favors exactness in the clicked view over a
/// symmetric least-squares compromise; the other views absorb the residual.
///
/// ```
/// use mvl_core::{ProjectionMatrix, TriangulatorAnchored, WorldEstimate};
/// use mvl_core::nalgebra::Vector4;
/// use mvl_geom::AnchoredDltTriangulator;
///
/// let left = ProjectionMatrix::from_rows([
///     [1.0, 0.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0, 0.0],
///     [0.0, 0.0, 1.0, 1.0],
/// ]);
/// let right = ProjectionMatrix::from_rows([
///     [1.0, 0.0, 0.0, 1.0],
///     [0.0, 1.0, 0.0, 0.0],
///     [0.0, 0.0, 1.0, 1.0],
/// ]);
/// let truth = WorldEstimate::from_homogeneous(Vector4::new(0.3, 0.1, 2.0, 1.0));
/// let observations = [
///     (left, left.project(truth).unwrap()),
///     (right, right.project(truth).unwrap()),
/// ];
/// let estimate = AnchoredDltTriangulator::new()
///     .triangulate_anchored(observations.iter().copied(), 0)
///     .unwrap();
/// let distance = (estimate.point().unwrap() - truth.point().unwrap()).norm();
/// assert!(distance < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct AnchoredDltTriangulator {
    epsilon: f64,
    max_iterations: usize,
    rank_epsilon: f64,
}

impl AnchoredDltTriangulator {
    /// Creates an `AnchoredDltTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon used in the SVD solver.
    ///
    /// Default is `1e-12`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the maximum number of iterations for the SVD solver.
    ///
    /// Default is `1000`.
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Set the relative threshold under which a singular value counts as
    /// vanishing when checking for an ambiguous null space.
    ///
    /// Default is `1e-9`.
    #[must_use]
    pub fn rank_epsilon(self, rank_epsilon: f64) -> Self {
        Self {
            rank_epsilon,
            ..self
        }
    }
}

impl Default for AnchoredDltTriangulator {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 1000,
            rank_epsilon: 1e-9,
        }
    }
}

impl TriangulatorAnchored for AnchoredDltTriangulator {
    fn triangulate_anchored(
        &self,
        observations: impl Iterator<Item = (ProjectionMatrix, NormalizedPixel)> + Clone,
        anchor: usize,
    ) -> Option<WorldEstimate> {
        let views = observations.clone().count();
        if views < 2 || anchor >= views {
            return None;
        }

        // Three rows per view over the augmented unknowns (X, s_0, .., s_{n-1}).
        let mut design = DMatrix::<f64>::zeros(3 * views, 4 + views);
        for (ix, (projection, pixel)) in observations.clone().enumerate() {
            design
                .slice_mut((3 * ix, 0), (3, 4))
                .copy_from(&projection.0);
            let image_point = pixel.homogeneous();
            for (row, &component) in image_point.iter().enumerate() {
                design[(3 * ix + row, 4 + ix)] = -component;
            }
        }

        let svd = design.try_svd(false, true, self.epsilon, self.max_iterations)?;
        let v_t = svd.v_t.as_ref()?;
        let (smallest, _) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by_key(|&(_, &s)| FloatOrd(s))?;
        let largest = svd
            .singular_values
            .iter()
            .copied()
            .max_by_key(|&s| FloatOrd(s))?;

        // More than one vanishing singular value means the observations do not
        // pin down a unique null direction (duplicated or parallel views); any
        // vector the solver picked from that space would be spurious.
        let vanishing = svd
            .singular_values
            .iter()
            .filter(|&&s| s <= self.rank_epsilon * largest)
            .count();
        if vanishing > 1 {
            debug!(
                "ambiguous null space ({} vanishing singular values across {} views)",
                vanishing, views
            );
            return None;
        }

        let solution = v_t.row(smallest).transpose();

        // Remove the solution's component in the span of the anchor view's
        // constraint rows. What remains is orthogonal to all three rows, so
        // the anchor equations hold exactly and the anchor view reprojects
        // onto its observation.
        let (projection, pixel) = observations.clone().nth(anchor)?;
        let mut constraints = DMatrix::<f64>::zeros(4 + views, 3);
        constraints
            .slice_mut((0, 0), (4, 3))
            .copy_from(&projection.0.transpose());
        let image_point = pixel.homogeneous();
        for (column, &component) in image_point.iter().enumerate() {
            constraints[(4 + anchor, column)] = -component;
        }
        let q = constraints.qr().q();
        let corrected: DVector<f64> = &solution - &q * (q.transpose() * &solution);

        Some(WorldEstimate::from_homogeneous(Vector4::new(
            corrected[0],
            corrected[1],
            corrected[2],
            corrected[3],
        )))
        .filter(|estimate| estimate.homogeneous().iter().all(|n| n.is_finite()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point3;

    fn left() -> ProjectionMatrix {
        ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
        ])
    }

    fn right() -> ProjectionMatrix {
        ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
        ])
    }

    fn above() -> ProjectionMatrix {
        ProjectionMatrix::from_rows([
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 2.0],
        ])
    }

    fn observe(projection: ProjectionMatrix, point: Point3<f64>) -> NormalizedPixel {
        projection
            .project(WorldEstimate::from_homogeneous(point.to_homogeneous()))
            .unwrap()
    }

    #[test]
    fn recovers_two_view_toy_scenario() {
        let truth = Point3::new(0.0, 0.0, 5.0);
        let observations = [
            (left(), observe(left(), truth)),
            (right(), observe(right(), truth)),
        ];

        let estimate = AnchoredDltTriangulator::new()
            .triangulate_anchored(observations.iter().copied(), 0)
            .unwrap();
        let point = estimate.point().unwrap();
        assert!((point - truth).norm() < 1e-6, "triangulated: {}", point);

        // The anchor view reprojects exactly onto its observation.
        let reprojected = left().project(estimate).unwrap();
        assert!((reprojected.0 - observations[0].1 .0).norm() < 1e-9);
    }

    #[test]
    fn anchor_is_exact_under_inconsistent_observations() {
        let truth = Point3::new(0.3, 0.1, 2.0);
        let exact = observe(left(), truth);
        let shifted = NormalizedPixel::new(
            observe(right(), truth).x + 0.01,
            observe(right(), truth).y,
        );
        let observations = [(left(), exact), (right(), shifted)];

        // Anchored on the consistent view, that view must reproject exactly.
        let estimate = AnchoredDltTriangulator::new()
            .triangulate_anchored(observations.iter().copied(), 0)
            .unwrap();
        let reprojected = left().project(estimate).unwrap();
        assert!((reprojected.0 - exact.0).norm() < 1e-9);

        // Anchored on the shifted view, the shifted observation is the one
        // reproduced exactly, and the other view absorbs the inconsistency.
        let estimate = AnchoredDltTriangulator::new()
            .triangulate_anchored(observations.iter().copied(), 1)
            .unwrap();
        let reprojected = right().project(estimate).unwrap();
        assert!((reprojected.0 - shifted.0).norm() < 1e-9);
    }

    #[test]
    fn consistent_observation_does_not_move_the_solution() {
        let truth = Point3::new(0.3, 0.1, 2.0);
        let two = [
            (left(), observe(left(), truth)),
            (right(), observe(right(), truth)),
        ];
        let three = [
            (left(), observe(left(), truth)),
            (right(), observe(right(), truth)),
            (above(), observe(above(), truth)),
        ];

        let from_two = AnchoredDltTriangulator::new()
            .triangulate_anchored(two.iter().copied(), 0)
            .unwrap()
            .point()
            .unwrap();
        let from_three = AnchoredDltTriangulator::new()
            .triangulate_anchored(three.iter().copied(), 0)
            .unwrap()
            .point()
            .unwrap();
        assert!((from_two - from_three).norm() < 1e-8);
        assert!((from_two - truth).norm() < 1e-8);
    }

    #[test]
    fn duplicated_views_are_degenerate() {
        let truth = Point3::new(0.3, 0.1, 2.0);
        let observation = observe(left(), truth);
        let observations = [(left(), observation), (left(), observation)];

        assert!(AnchoredDltTriangulator::new()
            .triangulate_anchored(observations.iter().copied(), 0)
            .is_none());
    }

    #[test]
    fn too_few_observations() {
        let truth = Point3::new(0.3, 0.1, 2.0);
        let one = [(left(), observe(left(), truth))];

        let triangulator = AnchoredDltTriangulator::new();
        assert!(triangulator
            .triangulate_anchored(one.iter().copied(), 0)
            .is_none());
        assert!(triangulator
            .triangulate_anchored(core::iter::empty(), 0)
            .is_none());
    }

    #[test]
    fn anchor_must_be_a_labeled_view() {
        let truth = Point3::new(0.3, 0.1, 2.0);
        let observations = [
            (left(), observe(left(), truth)),
            (right(), observe(right(), truth)),
        ];

        assert!(AnchoredDltTriangulator::new()
            .triangulate_anchored(observations.iter().copied(), 2)
            .is_none());
    }
}
