//! This crate provides the shared types and abstractions for multi-view
//! landmark annotation. Every crate in the workspace that touches annotation
//! data depends on this crate. It contains the coordinate newtypes, the
//! projection matrix wrapper, and the triangulator trait that connects the
//! annotation session to the numerical engine.
//!
//! ## The annotation problem
//!
//! A landmark (a "joint") is clicked in one or more calibrated camera views.
//! Each view `i` has a known 3x4 projection matrix `P_i` mapping homogeneous
//! world coordinates to homogeneous image coordinates, and each click is a
//! normalized image point `(u, v)` expressed as fractions of the image width
//! and height. When the same joint is labeled in at least two views, a single
//! 3d point can be recovered by triangulation and reprojected back into every
//! view:
//!
//! ```text
//!              x <- the 3d joint position
//!             / \
//!            /   \
//!   @@@@@@@a@@@   \
//!          /    @@@b@@@@@
//!         /       \
//!        O         O
//!     view A     view B
//! ```
//!
//! `O` marks a camera's optical center, `@` its image plane, and `a`/`b` the
//! clicks observing the same joint. The engine that solves this lives in
//! `mvl-geom`; this crate only defines the [`TriangulatorAnchored`] seam so
//! that session logic does not depend on any particular solver.
//!
//! The crate is `#![no_std]` so the types can be used anywhere nalgebra can.

#![no_std]

mod estimate;
mod pixel;
mod projection;
mod triangulation;

pub use estimate::*;
pub use pixel::*;
pub use projection::*;
pub use triangulation::*;

pub use nalgebra;
