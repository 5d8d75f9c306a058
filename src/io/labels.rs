//! Label readers translating annotation pixel values to classes and back

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::configuration::BACKGROUND_CLASS;
use crate::io::error::{Result, SamplingError, file_system, invalid_parameter};
use crate::sampling::sources::{ClassLabel, LabelReader};

/// Annotation masks whose pixel values are the class labels themselves
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityLabels;

impl LabelReader for IdentityLabels {
    fn label_to_pixel(&self, class: ClassLabel) -> Result<u32> {
        Ok(class)
    }

    fn pixel_to_label(&self, pixel: u32) -> Option<ClassLabel> {
        Some(pixel)
    }
}

/// One named class of a palette
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// Human-readable class name
    pub name: String,
    /// Class label
    pub class: ClassLabel,
    /// Pixel value drawn for the class in annotation masks
    pub pixel: u32,
}

#[derive(Deserialize)]
struct PaletteFile {
    labels: Vec<LabelEntry>,
}

/// Explicit class/pixel table, typically read from JSON
///
/// ```json
/// { "labels": [ { "name": "tumour", "class": 1, "pixel": 255 } ] }
/// ```
///
/// Class 0 is drawn with pixel 0 unless the table says otherwise. Pixels
/// absent from the table read as class 0.
#[derive(Clone, Debug)]
pub struct LabelPalette {
    entries: Vec<LabelEntry>,
    by_class: BTreeMap<ClassLabel, u32>,
    by_pixel: BTreeMap<u32, ClassLabel>,
}

impl LabelPalette {
    /// Build a palette from its entries
    ///
    /// # Errors
    ///
    /// Returns an error if a class or a pixel value appears twice
    pub fn from_entries(mut entries: Vec<LabelEntry>) -> Result<Self> {
        if !entries.iter().any(|entry| entry.class == BACKGROUND_CLASS) {
            entries.insert(
                0,
                LabelEntry {
                    name: "unannotated".to_string(),
                    class: BACKGROUND_CLASS,
                    pixel: 0,
                },
            );
        }

        let mut by_class = BTreeMap::new();
        let mut by_pixel = BTreeMap::new();
        for entry in &entries {
            if by_class.insert(entry.class, entry.pixel).is_some() {
                return Err(invalid_parameter(
                    "labels",
                    &entry.class,
                    &"class listed twice",
                ));
            }
            if by_pixel.insert(entry.pixel, entry.class).is_some() {
                return Err(invalid_parameter(
                    "labels",
                    &entry.pixel,
                    &"pixel value shared by two classes",
                ));
            }
        }

        Ok(Self {
            entries,
            by_class,
            by_pixel,
        })
    }

    /// Read a palette from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The content is not a palette
    /// - A class or pixel value appears twice
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| file_system(path, "read palette", e))?;
        let file: PaletteFile =
            serde_json::from_str(&content).map_err(|e| SamplingError::Serialization {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_entries(file.labels)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    /// Name of a class
    pub fn name_of(&self, class: ClassLabel) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.class == class)
            .map(|entry| entry.name.as_str())
    }
}

impl LabelReader for LabelPalette {
    fn label_to_pixel(&self, class: ClassLabel) -> Result<u32> {
        self.by_class
            .get(&class)
            .copied()
            .ok_or(SamplingError::UnknownLabel { class })
    }

    fn pixel_to_label(&self, pixel: u32) -> Option<ClassLabel> {
        self.by_pixel.get(&pixel).copied()
    }
}
