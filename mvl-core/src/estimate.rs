use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The triangulated 3d position of a joint, as a homogeneous 4-vector.
///
/// No constraints are put on the vector; any nonzero scalar multiple denotes
/// the same position. The homogeneous form is kept all the way through
/// reprojection because dividing out the scale early would destroy the exact
/// consistency the engine establishes with the anchor view.
///
/// The Euclidean position is recovered with [`WorldEstimate::point`], which
/// fails when the last component vanishes (a point at infinity, which in this
/// system always indicates degenerate camera geometry).
///
/// ```
/// use mvl_core::WorldEstimate;
/// use mvl_core::nalgebra::{Point3, Vector4};
///
/// let estimate = WorldEstimate::from_homogeneous(Vector4::new(0.2, 0.4, 1.0, 0.2));
/// assert_eq!(estimate.point(), Some(Point3::new(1.0, 2.0, 5.0)));
/// assert_eq!(WorldEstimate::from_homogeneous(Vector4::new(1.0, 2.0, 3.0, 0.0)).point(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldEstimate(pub Vector4<f64>);

impl WorldEstimate {
    /// Wraps a homogeneous 4-vector.
    pub fn from_homogeneous(homogeneous: Vector4<f64>) -> Self {
        Self(homogeneous)
    }

    /// Retrieves the homogeneous vector.
    pub fn homogeneous(self) -> Vector4<f64> {
        self.0
    }

    /// Retrieves the Euclidean 3d point by dividing through the last
    /// coordinate, or `None` if the estimate lies at infinity or is not
    /// finite.
    pub fn point(self) -> Option<Point3<f64>> {
        Point3::from_homogeneous(self.0).filter(|point| point.coords.iter().all(|n| n.is_finite()))
    }
}
