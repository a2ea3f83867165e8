use crate::{NormalizedPixel, WorldEstimate};
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3x4, Point2};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A view's 3x4 projection matrix, mapping homogeneous world coordinates to
/// homogeneous normalized image coordinates.
///
/// The matrix folds the view's intrinsics and pose into a single linear map,
/// which is all the triangulation engine needs. Matrices are supplied by the
/// project (entered through the matrix wizard or read from the project
/// configuration), never computed here; camera calibration is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ProjectionMatrix(pub Matrix3x4<f64>);

impl ProjectionMatrix {
    /// Creates a projection matrix from row-major 3x4 data.
    pub fn from_rows(rows: [[f64; 4]; 3]) -> Self {
        Self(Matrix3x4::from_fn(|r, c| rows[r][c]))
    }

    /// The all-zero matrix, the placeholder value a view holds until its
    /// matrix has been entered. A committed store never contains one.
    pub fn zeros() -> Self {
        Self(Matrix3x4::zeros())
    }

    /// Whether every entry is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&entry| entry == 0.0)
    }

    /// Reprojects a world estimate into this view.
    ///
    /// The homogeneous estimate is mapped through the matrix and the first
    /// two components are divided by the third. A vanishing or non-finite
    /// divisor means the point projects to infinity in this view, which the
    /// caller must treat as "no valid estimate" rather than writing an
    /// annotation.
    ///
    /// ```
    /// use mvl_core::{NormalizedPixel, ProjectionMatrix, WorldEstimate};
    /// use mvl_core::nalgebra::Vector4;
    ///
    /// let projection = ProjectionMatrix::from_rows([
    ///     [1.0, 0.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0, 0.0],
    ///     [0.0, 0.0, 1.0, 1.0],
    /// ]);
    /// let estimate = WorldEstimate::from_homogeneous(Vector4::new(0.3, 0.1, 2.0, 1.0));
    /// assert_eq!(
    ///     projection.project(estimate),
    ///     Some(NormalizedPixel::new(0.3 / 3.0, 0.1 / 3.0)),
    /// );
    /// // A point in the camera's focal plane has no image.
    /// let degenerate = WorldEstimate::from_homogeneous(Vector4::new(0.3, 0.1, -1.0, 1.0));
    /// assert_eq!(projection.project(degenerate), None);
    /// ```
    pub fn project(&self, estimate: WorldEstimate) -> Option<NormalizedPixel> {
        Point2::from_homogeneous(self.0 * estimate.homogeneous())
            .filter(|pixel| pixel.coords.iter().all(|n| n.is_finite()))
            .map(NormalizedPixel)
    }
}
