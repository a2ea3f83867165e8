use crate::{Error, Result};
use mvl_core::NormalizedPixel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One image's annotations, indexed `[view][joint]`.
type Row = Vec<Vec<Option<NormalizedPixel>>>;

/// Images found on disk but not in the table, and vice versa.
///
/// Produced by [`ObservationTable::sync_images`] so the caller can confirm
/// with the user before the table is changed: added images get empty rows,
/// removed images lose their annotation data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The sparse 2d observation table: per (view, image, joint), either unset or
/// a normalized pixel.
///
/// Rows are keyed by image name and kept sorted, one row per image, which is
/// also the order the image cursor walks. Entries are written either by a
/// user click (one view) or by reprojection write-back (all views at once);
/// removal clears exactly one entry and never touches the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationTable {
    views: usize,
    joints: usize,
    rows: BTreeMap<String, Row>,
}

impl ObservationTable {
    pub fn new(views: usize, joints: usize) -> Self {
        Self {
            views,
            joints,
            rows: BTreeMap::new(),
        }
    }

    pub fn views(&self) -> usize {
        self.views
    }

    pub fn joints(&self) -> usize {
        self.joints
    }

    /// Image names in row order.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|name| name.as_str())
    }

    pub fn image_count(&self) -> usize {
        self.rows.len()
    }

    pub fn contains_image(&self, image: &str) -> bool {
        self.rows.contains_key(image)
    }

    fn empty_row(&self) -> Row {
        vec![vec![None; self.joints]; self.views]
    }

    fn row(&self, image: &str) -> Result<&Row> {
        self.rows
            .get(image)
            .ok_or_else(|| Error::UnknownImage(image.to_string()))
    }

    fn check_view(&self, view: usize) -> Result<()> {
        if view < self.views {
            Ok(())
        } else {
            Err(Error::UnknownView(view))
        }
    }

    fn check_joint(&self, joint: usize) -> Result<()> {
        if joint < self.joints {
            Ok(())
        } else {
            Err(Error::UnknownJoint(joint))
        }
    }

    pub fn get(&self, view: usize, image: &str, joint: usize) -> Result<Option<NormalizedPixel>> {
        self.check_view(view)?;
        self.check_joint(joint)?;
        Ok(self.row(image)?[view][joint])
    }

    pub fn is_labeled(&self, view: usize, image: &str, joint: usize) -> Result<bool> {
        Ok(self.get(view, image, joint)?.is_some())
    }

    pub fn set(
        &mut self,
        view: usize,
        image: &str,
        joint: usize,
        pixel: NormalizedPixel,
    ) -> Result<()> {
        self.check_view(view)?;
        self.check_joint(joint)?;
        let row = self
            .rows
            .get_mut(image)
            .ok_or_else(|| Error::UnknownImage(image.to_string()))?;
        row[view][joint] = Some(pixel);
        Ok(())
    }

    /// Clears one view's entry for the joint. The other views' entries are
    /// left exactly as they are, including values that an earlier
    /// triangulation wrote.
    pub fn clear(&mut self, view: usize, image: &str, joint: usize) -> Result<()> {
        self.check_view(view)?;
        self.check_joint(joint)?;
        let row = self
            .rows
            .get_mut(image)
            .ok_or_else(|| Error::UnknownImage(image.to_string()))?;
        row[view][joint] = None;
        Ok(())
    }

    /// All views where the joint is labeled on this image, with their pixels,
    /// in view order.
    pub fn labeled_views(
        &self,
        image: &str,
        joint: usize,
    ) -> Result<Vec<(usize, NormalizedPixel)>> {
        self.check_joint(joint)?;
        Ok(self
            .row(image)?
            .iter()
            .enumerate()
            .filter_map(|(view, entries)| entries[joint].map(|pixel| (view, pixel)))
            .collect())
    }

    /// Writes one pixel per view for the joint in a single step, the
    /// write-back a successful triangulation performs.
    pub fn set_all(&mut self, image: &str, joint: usize, pixels: &[NormalizedPixel]) -> Result<()> {
        self.check_joint(joint)?;
        if pixels.len() != self.views {
            return Err(Error::MismatchedTable {
                views: self.views,
                joints: self.joints,
            });
        }
        let row = self
            .rows
            .get_mut(image)
            .ok_or_else(|| Error::UnknownImage(image.to_string()))?;
        for (view, &pixel) in pixels.iter().enumerate() {
            row[view][joint] = Some(pixel);
        }
        Ok(())
    }

    /// Compares the table's rows against the images on disk.
    pub fn sync_images(&self, on_disk: &[String]) -> SyncReport {
        let added = on_disk
            .iter()
            .filter(|name| !self.rows.contains_key(*name))
            .cloned()
            .collect();
        let removed = self
            .rows
            .keys()
            .filter(|name| !on_disk.contains(name))
            .cloned()
            .collect();
        SyncReport { added, removed }
    }

    /// Applies a sync report: empty rows for added images, dropped rows for
    /// removed ones.
    pub fn apply_sync(&mut self, report: &SyncReport) {
        for name in &report.removed {
            self.rows.remove(name);
        }
        for name in &report.added {
            self.rows.insert(name.clone(), self.empty_row());
        }
    }

    /// Whether the joint is missing (unset in at least one view) on the image
    /// at `index`.
    fn joint_missing(&self, row: &Row, joint: usize) -> bool {
        row.iter().any(|entries| entries[joint].is_none())
    }

    /// Whether any of the given joints is missing on the image.
    pub fn missing_any(&self, image: &str, joints: &[usize]) -> Result<bool> {
        let row = self.row(image)?;
        Ok(joints.iter().any(|&joint| self.joint_missing(row, joint)))
    }

    /// Whether every one of the given joints is missing on the image.
    pub fn missing_all(&self, image: &str, joints: &[usize]) -> Result<bool> {
        let row = self.row(image)?;
        Ok(joints.iter().all(|&joint| self.joint_missing(row, joint)))
    }

    /// The next image after `current` (wrapping around) where at least one of
    /// the displayed joints is missing, or `None` when every other image is
    /// fully annotated.
    pub fn next_missing_any(&self, current: usize, displayed: &[usize]) -> Option<usize> {
        self.scan(current, |row| {
            displayed
                .iter()
                .any(|&joint| self.joint_missing(row, joint))
        })
    }

    /// The next image after `current` (wrapping around) where every displayed
    /// joint is missing.
    pub fn next_missing_all(&self, current: usize, displayed: &[usize]) -> Option<usize> {
        self.scan(current, |row| {
            displayed
                .iter()
                .all(|&joint| self.joint_missing(row, joint))
        })
    }

    fn scan(&self, current: usize, matches: impl Fn(&Row) -> bool) -> Option<usize> {
        let rows: Vec<&Row> = self.rows.values().collect();
        let count = rows.len();
        if count == 0 {
            return None;
        }
        (1..=count)
            .map(|offset| (current + offset) % count)
            .find(|&index| matches(rows[index]))
    }

    pub fn load(path: impl AsRef<Path>, views: usize, joints: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table: Self = serde_json::from_reader(file)?;
        let shaped = table.views == views
            && table.joints == joints
            && table.rows.values().all(|row| {
                row.len() == views && row.iter().all(|entries| entries.len() == joints)
            });
        if !shaped {
            return Err(Error::MismatchedTable { views, joints });
        }
        Ok(table)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
