use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point2, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A 2d observation of a joint in one view, in normalized image coordinates.
///
/// The coordinates are fractions of the image width and height, so a point in
/// the visible image area lies in `[0, 1] x [0, 1]`. Normalizing by the image
/// size keeps annotations independent of the resolution each view was
/// captured at. Reprojections of a triangulated point may legitimately fall
/// outside the unit square when the point is outside a view's frustum, so the
/// range is not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NormalizedPixel(pub Point2<f64>);

impl NormalizedPixel {
    /// Creates a normalized pixel from its `(u, v)` components.
    pub fn new(u: f64, v: f64) -> Self {
        Self(Point2::new(u, v))
    }

    /// The homogeneous image point `(u, v, 1)` this observation constrains.
    pub fn homogeneous(self) -> Vector3<f64> {
        self.0.coords.push(1.0)
    }
}
