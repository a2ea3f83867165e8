//! Project state for multi-view landmark annotation.
//!
//! A labeling project is a folder with a JSON configuration (`cfg.json`), a
//! folder of images shared by all camera views, and a row-per-image
//! annotation table (`pixel-annotation-data.json`). This crate owns all of
//! that state and the session logic that ties a user's click to the
//! triangulation engine:
//!
//! * [`ProjectConfig`] — the persisted project description and its
//!   validation rules.
//! * [`MatrixEntrySession`] — the sequential wizard through which the
//!   per-view 3x4 projection matrices are entered and committed.
//! * [`ObservationTable`] — the sparse (view, image, joint) table of
//!   normalized pixel observations, with persistence, image reconciliation,
//!   and the missing-annotation scans.
//! * [`AnnotationSession`] — one click in, one triangulate-and-reproject
//!   cycle out, generic over any [`mvl_core::TriangulatorAnchored`].
//! * [`Project`] — the open-a-folder flow gluing the above together.
//!
//! The display layer (windows, viewers, dialogs) lives elsewhere and only
//! calls into these types.

mod colors;
mod config;
mod error;
mod matrices;
mod project;
mod session;
mod table;

pub use colors::*;
pub use config::*;
pub use error::*;
pub use matrices::*;
pub use project::*;
pub use session::*;
pub use table::*;

pub use mvl_geom::AnchoredDltTriangulator;
