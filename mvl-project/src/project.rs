use crate::{
    AnnotationSession, ObservationTable, ProjectConfig, Result, SyncReport, CONFIG_FILE, TABLE_FILE,
};
use log::info;
use mvl_core::TriangulatorAnchored;
use mvl_geom::AnchoredDltTriangulator;
use std::path::{Path, PathBuf};

/// A labeling project as it sits on disk: its configuration, its annotation
/// table, and the reconciliation still pending between the table's rows and
/// the images actually present in the image folder.
///
/// Opening never mutates anything. The pending [`SyncReport`] is exposed so
/// the caller can confirm with the user before [`Project::apply_sync`] adds
/// empty rows for new images and drops the rows of deleted ones.
#[derive(Debug, Clone)]
pub struct Project {
    folder: PathBuf,
    config: ProjectConfig,
    table: ObservationTable,
    sync: SyncReport,
}

impl Project {
    /// Opens the project in `folder`: loads and validates `cfg.json`,
    /// discovers the images, and loads the annotation table (or starts an
    /// empty one).
    pub fn open(folder: impl AsRef<Path>) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();
        let config = ProjectConfig::load(folder.join(CONFIG_FILE))?;
        config.validate()?;
        let images = config.discover_images()?;

        let table_path = folder.join(TABLE_FILE);
        let table = if table_path.exists() {
            info!("loading annotation table from {}", table_path.display());
            ObservationTable::load(&table_path, config.views.len(), config.joints.len())?
        } else {
            info!("no annotation table yet, starting empty");
            ObservationTable::new(config.views.len(), config.joints.len())
        };
        let sync = table.sync_images(&images);

        Ok(Self {
            folder,
            config,
            table,
            sync,
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    /// The reconciliation pending against the image folder.
    pub fn sync(&self) -> &SyncReport {
        &self.sync
    }

    /// Applies the pending reconciliation to the table.
    pub fn apply_sync(&mut self) {
        if !self.sync.is_empty() {
            info!(
                "syncing table rows: {} image(s) added, {} removed",
                self.sync.added.len(),
                self.sync.removed.len()
            );
        }
        self.table.apply_sync(&self.sync);
        self.sync = SyncReport::default();
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save(self.folder.join(CONFIG_FILE))
    }

    /// Builds the annotation session, consuming the project. The pending
    /// reconciliation must have been applied (or be empty); the session path
    /// for saving the table afterwards is returned alongside.
    pub fn into_session<T: TriangulatorAnchored>(
        self,
        triangulator: T,
    ) -> Result<(AnnotationSession<T>, PathBuf)> {
        let matrices = self.config.matrices()?;
        let session = AnnotationSession::new(
            self.config.views,
            self.config.joints,
            matrices,
            self.table,
            triangulator,
        )?;
        Ok((session, self.folder.join(TABLE_FILE)))
    }

    /// Opens a project and builds a session with the default engine,
    /// applying any pending image reconciliation without confirmation.
    pub fn open_session(
        folder: impl AsRef<Path>,
    ) -> Result<(AnnotationSession<AnchoredDltTriangulator>, PathBuf)> {
        let mut project = Self::open(folder)?;
        project.apply_sync();
        project.into_session(AnchoredDltTriangulator::new())
    }
}
