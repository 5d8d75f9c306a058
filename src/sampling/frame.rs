//! Patch metadata records and the columnar patch frame they are assembled into

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sampling::sources::ClassLabel;

/// Metadata of one accepted patch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Identifier of the slide the patch belongs to
    #[serde(rename = "id")]
    pub slide_id: String,
    /// Horizontal level-0 offset
    #[serde(rename = "w")]
    pub x: u64,
    /// Vertical level-0 offset
    #[serde(rename = "h")]
    pub y: u64,
    /// Class whose seed produced the patch
    pub class: ClassLabel,
    /// Magnification the patch was read at
    #[serde(rename = "mag")]
    pub magnification: f64,
    /// Patch edge length in pixels
    pub size: u32,
    /// Slide file
    pub parent: PathBuf,
    /// Objective magnification at level 0
    #[serde(rename = "lvl0")]
    pub level0: f64,
}

/// Ordered table of accepted patches, stored column by column
///
/// Row order is acceptance order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchFrame {
    id: Vec<String>,
    w: Vec<u64>,
    h: Vec<u64>,
    class: Vec<ClassLabel>,
    mag: Vec<f64>,
    size: Vec<u32>,
    parent: Vec<PathBuf>,
    lvl0: Vec<f64>,
}

impl PatchFrame {
    /// Convert accumulated records into columns in one pass
    pub fn from_records(records: Vec<PatchRecord>) -> Self {
        let mut frame = Self::with_capacity(records.len());
        for record in records {
            frame.id.push(record.slide_id);
            frame.w.push(record.x);
            frame.h.push(record.y);
            frame.class.push(record.class);
            frame.mag.push(record.magnification);
            frame.size.push(record.size);
            frame.parent.push(record.parent);
            frame.lvl0.push(record.level0);
        }
        frame
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            w: Vec::with_capacity(capacity),
            h: Vec::with_capacity(capacity),
            class: Vec::with_capacity(capacity),
            mag: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            lvl0: Vec::with_capacity(capacity),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.class.len()
    }

    /// Whether no patch was accepted
    pub fn is_empty(&self) -> bool {
        self.class.is_empty()
    }

    /// Class column
    pub fn classes(&self) -> &[ClassLabel] {
        &self.class
    }

    /// Rebuild the row at `index`
    pub fn record(&self, index: usize) -> Option<PatchRecord> {
        Some(PatchRecord {
            slide_id: self.id.get(index)?.clone(),
            x: *self.w.get(index)?,
            y: *self.h.get(index)?,
            class: *self.class.get(index)?,
            magnification: *self.mag.get(index)?,
            size: *self.size.get(index)?,
            parent: self.parent.get(index)?.clone(),
            level0: *self.lvl0.get(index)?,
        })
    }

    /// Rows in acceptance order
    pub fn records(&self) -> impl Iterator<Item = PatchRecord> + '_ {
        (0..self.len()).filter_map(|index| self.record(index))
    }

    /// Accepted patches per class
    pub fn class_counts(&self) -> BTreeMap<ClassLabel, usize> {
        let mut counts = BTreeMap::new();
        for &class in &self.class {
            *counts.entry(class).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every column has the same length
    ///
    /// Frames decoded from disk are only trusted after this check.
    pub fn is_consistent(&self) -> bool {
        let rows = self.len();
        [
            self.id.len(),
            self.w.len(),
            self.h.len(),
            self.mag.len(),
            self.size.len(),
            self.parent.len(),
            self.lvl0.len(),
        ]
        .iter()
        .all(|&column| column == rows)
    }
}
