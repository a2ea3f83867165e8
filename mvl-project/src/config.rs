use crate::{Error, Result};
use mvl_core::ProjectionMatrix;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the project configuration inside the project folder.
pub const CONFIG_FILE: &str = "cfg.json";

/// File name of the annotation table inside the project folder.
pub const TABLE_FILE: &str = "pixel-annotation-data.json";

/// The kind of project, as recorded in the configuration file.
///
/// Only multi-view and single-view projects are handled here; depth projects
/// are recognized so their configuration files parse, but opening one is
/// refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectMode {
    #[serde(rename = "RGB Single View")]
    RgbSingleView,
    #[serde(rename = "RGB Multi View")]
    RgbMultiView,
    #[serde(rename = "RGB Depth")]
    RgbDepth,
}

/// The persisted description of a labeling project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub mode: ProjectMode,
    /// Folder holding the configuration and the annotation table.
    pub project_folder: PathBuf,
    /// Folder holding the images, one file per frame per view.
    pub image_folder: PathBuf,
    /// Extension of the image files, with the leading dot (".png", ".jpg").
    pub image_extension: String,
    /// Ordered view names. Single-view projects have exactly one.
    pub views: Vec<String>,
    /// Ordered joint names.
    pub joints: Vec<String>,
    /// One 3x4 projection matrix per view, row major. Absent until the
    /// matrix entry session has been completed once.
    #[serde(default)]
    pub projection_matrices: Option<Vec<[[f64; 4]; 3]>>,
}

impl ProjectConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_folder.join(CONFIG_FILE)
    }

    pub fn table_path(&self) -> PathBuf {
        self.project_folder.join(TABLE_FILE)
    }

    /// Checks the invariants a project must satisfy before a session may be
    /// built on it: a supported mode, at least one joint, and for multi-view
    /// projects at least two views whose matrices (when present) are not all
    /// zero.
    pub fn validate(&self) -> Result<()> {
        if self.mode == ProjectMode::RgbDepth {
            return Err(Error::UnsupportedMode("RGB Depth".to_string()));
        }
        if self.joints.is_empty() {
            return Err(Error::NoJoints);
        }
        if self.mode == ProjectMode::RgbMultiView {
            if self.views.len() < 2 {
                return Err(Error::TooFewViews(self.views.len()));
            }
            if let Some(matrices) = &self.projection_matrices {
                if matrices.len() != self.views.len() {
                    return Err(Error::MissingMatrices);
                }
                for (view, rows) in self.views.iter().zip(matrices) {
                    if ProjectionMatrix::from_rows(*rows).is_zero() {
                        return Err(Error::ZeroMatrix(view.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// The committed per-view projection matrices, or `MissingMatrices` if
    /// the matrix entry session has not run yet.
    pub fn matrices(&self) -> Result<Vec<ProjectionMatrix>> {
        let matrices = self
            .projection_matrices
            .as_ref()
            .ok_or(Error::MissingMatrices)?;
        if matrices.len() != self.views.len() {
            return Err(Error::MissingMatrices);
        }
        Ok(matrices
            .iter()
            .map(|rows| ProjectionMatrix::from_rows(*rows))
            .collect())
    }

    /// Records a committed set of per-view matrices, as produced by the
    /// matrix entry session.
    pub fn set_matrices(&mut self, matrices: &[ProjectionMatrix]) {
        self.projection_matrices = Some(
            matrices
                .iter()
                .map(|matrix| {
                    let mut rows = [[0.0; 4]; 3];
                    for (r, row) in rows.iter_mut().enumerate() {
                        for (c, cell) in row.iter_mut().enumerate() {
                            *cell = matrix.0[(r, c)];
                        }
                    }
                    rows
                })
                .collect(),
        );
    }

    /// Lists the image file names in the image folder with the configured
    /// extension, sorted. Only images that exist on disk can be annotated.
    pub fn discover_images(&self) -> Result<Vec<String>> {
        let pattern = self
            .image_folder
            .join(format!("*{}", self.image_extension));
        let mut names: Vec<String> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(|entry| entry.ok())
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(Error::NoImages {
                folder: self.image_folder.to_string_lossy().into_owned(),
                extension: self.image_extension.clone(),
            });
        }
        Ok(names)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> ProjectConfig {
        ProjectConfig {
            mode: ProjectMode::RgbMultiView,
            project_folder: PathBuf::from("/tmp/project"),
            image_folder: PathBuf::from("/tmp/images"),
            image_extension: ".png".to_string(),
            views: vec!["left".to_string(), "right".to_string()],
            joints: vec!["head".to_string(), "tail".to_string()],
            projection_matrices: None,
        }
    }

    #[test]
    fn mode_strings_round_trip() {
        let json = serde_json::to_string(&ProjectMode::RgbMultiView).unwrap();
        assert_eq!(json, "\"RGB Multi View\"");
        let mode: ProjectMode = serde_json::from_str("\"RGB Single View\"").unwrap();
        assert_eq!(mode, ProjectMode::RgbSingleView);
    }

    #[test]
    fn multi_view_needs_two_views() {
        let mut config = config();
        config.views.truncate(1);
        assert!(matches!(config.validate(), Err(Error::TooFewViews(1))));
    }

    #[test]
    fn zero_matrix_fails_validation() {
        let mut config = config();
        config.projection_matrices = Some(vec![[[1.0; 4]; 3], [[0.0; 4]; 3]]);
        assert!(matches!(
            config.validate(),
            Err(Error::ZeroMatrix(view)) if view == "right"
        ));
    }

    #[test]
    fn depth_projects_are_refused() {
        let mut config = config();
        config.mode = ProjectMode::RgbDepth;
        assert!(matches!(config.validate(), Err(Error::UnsupportedMode(_))));
    }

    #[test]
    fn matrices_require_a_full_set() {
        let mut config = config();
        assert!(matches!(config.matrices(), Err(Error::MissingMatrices)));
        config.projection_matrices = Some(vec![[[1.0; 4]; 3]]);
        assert!(matches!(config.matrices(), Err(Error::MissingMatrices)));
        config.projection_matrices = Some(vec![[[1.0; 4]; 3], [[2.0; 4]; 3]]);
        assert_eq!(config.matrices().unwrap().len(), 2);
    }
}
