//! Low-resolution label grids serving tissue and annotation patches
//!
//! A mask cell covers `factor x factor` level-0 pixels. Patch requests are
//! answered by nearest-neighbour lookup of the cell under each patch pixel;
//! pixels beyond the grid read as `0`.

use std::path::Path;

use ndarray::Array2;

use crate::io::error::{Result, SamplingError, invalid_parameter};
use crate::sampling::sources::{
    AnnotationSource, LabelReader, LabelSource, PatchRequest, SlideSource, TissueSource,
};

/// Decode a grayscale label image into a grid of raw pixel values
///
/// # Errors
///
/// Returns an error if the file cannot be decoded as an image
pub fn load_label_grid(path: &Path) -> Result<Array2<u32>> {
    let luma = image::open(path)
        .map_err(|e| SamplingError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_luma8();

    let (width, height) = luma.dimensions();
    Ok(Array2::from_shape_fn(
        (height as usize, width as usize),
        |(row, col)| u32::from(luma.get_pixel(col as u32, row as u32).0[0]),
    ))
}

/// Label grid bound to a slide's coordinate system
#[derive(Clone, Debug)]
pub struct LabelGridMask {
    grid: Array2<u32>,
    level: usize,
    factor: f64,
    level0: f64,
}

impl LabelGridMask {
    /// Bind a grid to a pyramid level and downsample factor
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` or `level0` is not positive and finite
    pub fn new(grid: Array2<u32>, level: usize, factor: f64, level0: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(invalid_parameter(
                "downsample_factor",
                &factor,
                &"must be positive and finite",
            ));
        }
        if !(level0.is_finite() && level0 > 0.0) {
            return Err(invalid_parameter(
                "level0",
                &level0,
                &"must be positive and finite",
            ));
        }

        Ok(Self {
            grid,
            level,
            factor,
            level0,
        })
    }

    /// Bind a tissue grid to the slide level whose dimensions it matches
    ///
    /// # Errors
    ///
    /// Returns an error if no pyramid level has the grid's dimensions
    pub fn tissue_for(grid: Array2<u32>, slide: &dyn SlideSource) -> Result<Self> {
        let (rows, cols) = grid.dim();
        let shape = (cols as u64, rows as u64);

        let level = (0..slide.level_count())
            .find(|&level| slide.level_dimensions(level) == Some(shape))
            .ok_or_else(|| {
                invalid_parameter(
                    "tissue_mask",
                    &format!("{cols}x{rows}"),
                    &format!("matches no pyramid level of slide '{}'", slide.id()),
                )
            })?;
        let factor = slide.level_downsample(level).ok_or_else(|| {
            invalid_parameter("tissue_level", &level, &"has no downsample factor")
        })?;

        Self::new(grid, level, factor, slide.level0())
    }

    /// Bind an annotation grid to a slide, scaling by the width ratio
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty
    pub fn annotation_for(grid: Array2<u32>, slide: &dyn SlideSource) -> Result<Self> {
        let (_, cols) = grid.dim();
        if grid.is_empty() {
            return Err(invalid_parameter(
                "annotation_mask",
                &slide.id(),
                &"mask is empty",
            ));
        }

        let (width, _) = slide.dimensions();
        let factor = width as f64 / cols as f64;
        let level = (0..slide.level_count())
            .min_by(|&a, &b| {
                let distance = |level: usize| {
                    slide
                        .level_downsample(level)
                        .map_or(f64::INFINITY, |downsample| (downsample - factor).abs())
                };
                distance(a).total_cmp(&distance(b))
            })
            .unwrap_or(0);

        Self::new(grid, level, factor, slide.level0())
    }

    /// Downsample factor relative to level 0
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    fn sample_window(&self, request: &PatchRequest) -> Array2<u32> {
        let size = request.size as usize;
        let step = request.step(self.level0);

        Array2::from_shape_fn((size, size), |(row, col)| {
            let y = (request.y as f64 + row as f64 * step) / self.factor;
            let x = (request.x as f64 + col as f64 * step) / self.factor;
            self.grid
                .get((y.floor() as usize, x.floor() as usize))
                .copied()
                .unwrap_or(0)
        })
    }
}

impl LabelSource for LabelGridMask {
    fn label_patch(&self, request: &PatchRequest) -> Result<Array2<u32>> {
        Ok(self.sample_window(request))
    }
}

impl TissueSource for LabelGridMask {
    fn grid(&self) -> &Array2<u32> {
        &self.grid
    }

    fn level(&self) -> usize {
        self.level
    }
}

impl AnnotationSource for LabelGridMask {
    fn low_res(&self, reader: &dyn LabelReader) -> Result<(Array2<u32>, f64)> {
        let classes = self
            .grid
            .mapv(|pixel| reader.pixel_to_label(pixel).unwrap_or(0));
        Ok((classes, self.factor))
    }
}
