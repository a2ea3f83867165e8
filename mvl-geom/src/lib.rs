//! This crate contains the numerical engine for multi-view landmark
//! annotation: anchored triangulation.
//!
//! ## Anchored triangulation
//!
//! In this problem we know one projection matrix per view and the normalized
//! image point at which the same joint was labeled in each of two or more
//! views. We want the 3d point that best agrees with all observations, with
//! one extra requirement that ordinary triangulation does not have: the view
//! the user just clicked in (the *anchor*) must stay exactly consistent with
//! the click. The user's own input may never drift under their cursor; the
//! other views absorb the residual inconsistency instead.
//!
//! - `x` the point we are trying to triangulate
//! - `a` the anchor observation, which must reproject onto itself exactly
//! - `b` an observation in another view, which may shift slightly
//! - `O` the optical center of a camera
//! - `@` the image plane
//!
//! ```text
//!              x
//!             / \
//!            /   \
//!   @@@@@@@a@@@   \
//!          /    @@@b@@@@@
//!         /       \
//!        O         O
//! ```

pub mod triangulation;

pub use triangulation::AnchoredDltTriangulator;
