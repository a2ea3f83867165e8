use crate::{NormalizedPixel, ProjectionMatrix, WorldEstimate};

/// This trait is for algorithms which triangulate a joint's 3d position from
/// its 2d observations in two or more views, while keeping one designated
/// view (the one the user just clicked in) exactly consistent.
///
/// The observations are `(projection matrix, normalized pixel)` pairs for
/// every view where the joint is currently labeled, in a stable order, and
/// `anchor` is the position of the clicked view within that order. The
/// returned estimate must reproject through the anchor view's matrix onto the
/// anchor observation exactly (up to floating point rounding); the other
/// views absorb whatever inconsistency the observations carry.
///
/// `None` signals a degenerate configuration (fewer than two observations,
/// parallel or duplicated views, a point at infinity). Degeneracy is an
/// expected outcome, not an error: the caller falls back to storing the raw
/// click alone.
pub trait TriangulatorAnchored {
    fn triangulate_anchored(
        &self,
        observations: impl Iterator<Item = (ProjectionMatrix, NormalizedPixel)> + Clone,
        anchor: usize,
    ) -> Option<WorldEstimate>;
}
