//! Sampling constants and runtime configuration defaults

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::io::error::{Result, SamplingError, invalid_parameter};

// Patches must be overwhelmingly tissue to be usable; not exposed as an option
/// Minimum fraction of tissue cells a candidate patch must contain
pub const TISSUE_THRESHOLD: f64 = 0.9;

// Default values for configurable parameters
/// Default minimum fraction of annotation cells matching the sampled class
pub const DEFAULT_ANNO_THRESHOLD: f64 = 0.9;
/// Class 0 is skipped unless explicitly requested
pub const DEFAULT_IGNORE_BACKGROUND: bool = true;

/// Label reserved for unannotated tissue
pub const BACKGROUND_CLASS: u32 = 0;

// Output settings
/// Suffix appended to the slide identifier for the saved table
pub const PATCHFRAME_SUFFIX: &str = "_patchframe";
/// Extension of the saved table
pub const PATCHFRAME_EXTENSION: &str = "json";
/// Suffix of the sidecar carrying slide metadata (`<stem>.meta.json`)
pub const SLIDE_METADATA_SUFFIX: &str = ".meta.json";
/// Raster formats accepted as slides by the command-line tool
pub const SLIDE_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "jpg", "jpeg"];
/// Raster formats searched for tissue and annotation masks
pub const MASK_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "bmp"];

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;

/// Per-class cap on accepted patches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxPerClass {
    /// Attempt every seed of every class
    #[default]
    All,
    /// Stop a class once the quota boundary is reached
    Limit(usize),
}

impl FromStr for MaxPerClass {
    type Err = SamplingError;

    fn from_str(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match value.parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(Self::Limit(limit)),
            _ => Err(invalid_parameter(
                "max_per_class",
                &value,
                &"expected a positive integer or 'all'",
            )),
        }
    }
}

impl fmt::Display for MaxPerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Limit(limit) => write!(f, "{limit}"),
        }
    }
}

/// Options for a single sampling run
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingOptions {
    /// Exclude class 0 from the run
    pub ignore_background: bool,
    /// Per-class cap on accepted patches
    pub max_per_class: MaxPerClass,
    /// Directory the patch frame is written to
    pub output_dir: PathBuf,
    /// Minimum fraction of annotation cells matching the sampled class
    pub anno_threshold: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            ignore_background: DEFAULT_IGNORE_BACKGROUND,
            max_per_class: MaxPerClass::All,
            output_dir: PathBuf::from("."),
            anno_threshold: DEFAULT_ANNO_THRESHOLD,
        }
    }
}

impl SamplingOptions {
    /// Check option ranges
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `anno_threshold` lies outside `[0, 1]`
    /// - `max_per_class` is `Limit(0)`
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.anno_threshold) {
            return Err(invalid_parameter(
                "anno_threshold",
                &self.anno_threshold,
                &"must lie in [0, 1]",
            ));
        }
        if self.max_per_class == MaxPerClass::Limit(0) {
            return Err(invalid_parameter(
                "max_per_class",
                &self.max_per_class,
                &"must be positive",
            ));
        }
        Ok(())
    }
}

/// Base magnification of a slide
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Level0 {
    /// Known objective magnification at level 0
    Magnification(f64),
    /// Read the magnification from the slide metadata
    Infer,
}

impl FromStr for Level0 {
    type Err = SamplingError;

    fn from_str(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("infer") {
            return Ok(Self::Infer);
        }
        match value.parse::<f64>() {
            Ok(magnification) if magnification.is_finite() && magnification > 0.0 => {
                Ok(Self::Magnification(magnification))
            }
            _ => Err(invalid_parameter(
                "level0",
                &value,
                &"expected a positive magnification or 'infer'",
            )),
        }
    }
}
