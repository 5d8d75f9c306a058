//! Capabilities the sampler consumes from slide, mask and label providers
//!
//! The sampler never decodes slides or masks itself. Everything it reads goes
//! through these traits, so in-memory grids and file-backed images are
//! interchangeable.

use std::path::Path;

use image::RgbaImage;
use ndarray::Array2;

use crate::io::error::Result;

/// Class label; `0` is unannotated tissue
pub type ClassLabel = u32;

/// Full-resolution seed coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed {
    /// Vertical offset in level-0 pixels
    pub row: u64,
    /// Horizontal offset in level-0 pixels
    pub col: u64,
}

impl Seed {
    /// Create a seed from a level-0 `(row, col)` pair
    pub const fn new(row: u64, col: u64) -> Self {
        Self { row, col }
    }
}

/// Square region request in level-0 coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchRequest {
    /// Horizontal offset of the top-left corner
    pub x: u64,
    /// Vertical offset of the top-left corner
    pub y: u64,
    /// Magnification the patch is read at
    pub magnification: f64,
    /// Edge length of the returned patch in pixels
    pub size: u32,
}

impl PatchRequest {
    /// Request a patch whose top-left corner is the seed
    pub const fn at_seed(seed: Seed, magnification: f64, size: u32) -> Self {
        Self {
            x: seed.col,
            y: seed.row,
            magnification,
            size,
        }
    }

    /// Level-0 pixels covered by one patch pixel
    pub fn step(&self, level0: f64) -> f64 {
        level0 / self.magnification
    }
}

/// Whole-slide image
pub trait SlideSource {
    /// Stable slide identifier
    fn id(&self) -> &str;

    /// File the slide was read from
    fn path(&self) -> &Path;

    /// Objective magnification at level 0
    fn level0(&self) -> f64;

    /// Level-0 `(width, height)` in pixels
    fn dimensions(&self) -> (u64, u64);

    /// Number of pyramid levels
    fn level_count(&self) -> usize;

    /// Downsample factor of a pyramid level relative to level 0
    fn level_downsample(&self, level: usize) -> Option<f64>;

    /// `(width, height)` of a pyramid level, rounded up
    fn level_dimensions(&self, level: usize) -> Option<(u64, u64)> {
        let downsample = self.level_downsample(level)?;
        let (width, height) = self.dimensions();
        Some((
            (width as f64 / downsample).ceil() as u64,
            (height as f64 / downsample).ceil() as u64,
        ))
    }

    /// Read the pixels of a square region
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails
    fn read_patch(&self, request: &PatchRequest) -> Result<RgbaImage>;
}

/// Patch-addressable label source shared by tissue and annotation masks
pub trait LabelSource {
    /// Label values covering a square region, one per patch pixel
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails
    fn label_patch(&self, request: &PatchRequest) -> Result<Array2<u32>>;
}

/// Binary tissue mask; nonzero cells are tissue
pub trait TissueSource: LabelSource {
    /// Complete low-resolution grid
    fn grid(&self) -> &Array2<u32>;

    /// Pyramid level of the slide the grid corresponds to
    fn level(&self) -> usize;
}

/// Multi-class annotation mask
pub trait AnnotationSource: LabelSource {
    /// Low-resolution class grid and its downsample factor
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails
    fn low_res(&self, reader: &dyn LabelReader) -> Result<(Array2<u32>, f64)>;
}

/// Translation between class labels and annotation pixel values
pub trait LabelReader: Send + Sync {
    /// Pixel value annotation patches use for a class
    ///
    /// # Errors
    ///
    /// Returns `UnknownLabel` if the class has no pixel value
    fn label_to_pixel(&self, class: ClassLabel) -> Result<u32>;

    /// Class drawn with a pixel value, if any
    fn pixel_to_label(&self, pixel: u32) -> Option<ClassLabel>;
}

/// Fraction of cells satisfying a predicate; an empty grid yields `0.0`
pub fn fraction_matching<F>(patch: &Array2<u32>, predicate: F) -> f64
where
    F: Fn(u32) -> bool,
{
    let total = patch.len();
    if total == 0 {
        return 0.0;
    }
    let matching = patch.iter().filter(|&&value| predicate(value)).count();
    matching as f64 / total as f64
}
