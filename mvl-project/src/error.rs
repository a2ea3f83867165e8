use thiserror::Error;

/// Everything that can go wrong while managing a labeling project.
///
/// Degenerate triangulation is deliberately absent: the engine reports it as
/// `None` and the session downgrades the action to a raw single-view
/// annotation, so it never surfaces as an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("view index {0} is out of range")]
    UnknownView(usize),
    #[error("joint index {0} is out of range")]
    UnknownJoint(usize),
    #[error("no view named {0:?} in this project")]
    UnknownViewName(String),
    #[error("no joint named {0:?} in this project")]
    UnknownJointName(String),
    #[error("image {0:?} is not part of the project")]
    UnknownImage(String),
    #[error("matrix cell ({row}, {col}) is not a number: {text:?}")]
    MalformedEntry {
        row: usize,
        col: usize,
        text: String,
    },
    #[error("projection matrix for view {0:?} contains a non-finite entry")]
    NonFiniteMatrix(String),
    #[error("projection matrix for view {0:?} is all zero")]
    ZeroMatrix(String),
    #[error("a multi-view project needs at least two views, got {0}")]
    TooFewViews(usize),
    #[error("project defines no joints")]
    NoJoints,
    #[error("no {extension:?} images found in {folder:?}")]
    NoImages { folder: String, extension: String },
    #[error("project mode {0:?} is not supported by this tool")]
    UnsupportedMode(String),
    #[error("a multi-view project needs one projection matrix per view")]
    MissingMatrices,
    #[error("annotation table shape does not match the project ({views} views, {joints} joints)")]
    MismatchedTable { views: usize, joints: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, Error>;
