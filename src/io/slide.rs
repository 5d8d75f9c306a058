//! Flat raster images exposed as whole-slide images
//!
//! The image is level 0. A virtual power-of-two pyramid is reported so that
//! masks saved at a reduced level can be related to slide coordinates.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::Deserialize;

use crate::io::configuration::{Level0, SLIDE_METADATA_SUFFIX};
use crate::io::error::{Result, SamplingError, file_system, invalid_parameter};
use crate::sampling::sources::{PatchRequest, SlideSource};

/// Metadata sidecar stored next to a slide as `<stem>.meta.json`
#[derive(Debug, Deserialize)]
pub struct SlideMetadata {
    /// Objective magnification at level 0
    pub objective_power: f64,
}

/// Identifier of the slide stored at `path`: its file stem
pub fn slide_id(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Sidecar path holding the metadata of the slide at `path`
pub fn metadata_path(path: &Path) -> PathBuf {
    let name = format!("{}{SLIDE_METADATA_SUFFIX}", slide_id(path));
    path.parent()
        .map_or_else(|| PathBuf::from(&name), |parent| parent.join(&name))
}

/// Resolve the level-0 magnification of the slide at `path`
///
/// # Errors
///
/// Returns an error if:
/// - `Infer` is requested and the sidecar is missing or malformed
/// - The sidecar magnification is not positive
pub fn resolve_level0(path: &Path, level0: Level0) -> Result<f64> {
    if let Level0::Magnification(magnification) = level0 {
        return Ok(magnification);
    }

    let sidecar = metadata_path(path);
    let content =
        fs::read_to_string(&sidecar).map_err(|e| file_system(&sidecar, "read metadata", e))?;
    let metadata: SlideMetadata =
        serde_json::from_str(&content).map_err(|e| SamplingError::Serialization {
            path: sidecar.clone(),
            source: e,
        })?;

    if metadata.objective_power.is_finite() && metadata.objective_power > 0.0 {
        Ok(metadata.objective_power)
    } else {
        Err(invalid_parameter(
            "objective_power",
            &metadata.objective_power,
            &format!("sidecar '{}' must hold a positive value", sidecar.display()),
        ))
    }
}

/// Slide backed by a decoded RGBA raster
pub struct ImageSlide {
    id: String,
    path: PathBuf,
    level0: f64,
    image: RgbaImage,
}

impl ImageSlide {
    /// Decode a slide from disk
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be decoded as an image
    /// - The level-0 magnification cannot be resolved
    pub fn open(path: &Path, level0: Level0) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| SamplingError::ImageLoad {
                path: path.to_path_buf(),
                source: e,
            })?
            .to_rgba8();
        let level0 = resolve_level0(path, level0)?;

        Ok(Self::from_image(slide_id(path), path, image, level0))
    }

    /// Wrap an in-memory raster
    pub fn from_image(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        image: RgbaImage,
        level0: f64,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            level0,
            image,
        }
    }
}

impl SlideSource for ImageSlide {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn level0(&self) -> f64 {
        self.level0
    }

    fn dimensions(&self) -> (u64, u64) {
        (u64::from(self.image.width()), u64::from(self.image.height()))
    }

    fn level_count(&self) -> usize {
        let (width, height) = self.dimensions();
        let largest = width.max(height).max(1);
        (u64::BITS - largest.leading_zeros()) as usize
    }

    fn level_downsample(&self, level: usize) -> Option<f64> {
        (level < self.level_count()).then(|| 2f64.powi(level as i32))
    }

    fn read_patch(&self, request: &PatchRequest) -> Result<RgbaImage> {
        if request.size == 0 {
            return Err(invalid_parameter(
                "size",
                &request.size,
                &"must be positive",
            ));
        }

        let step = request.step(self.level0);
        let span = (f64::from(request.size) * step).round().max(1.0) as u64;
        let (width, height) = self.dimensions();

        // Pixels outside the raster stay transparent
        let mut patch = RgbaImage::new(request.size, request.size);
        if request.x >= width || request.y >= height {
            return Ok(patch);
        }

        // Only the visible part of the window is copied and resized
        let visible_width = request.x.saturating_add(span).min(width) - request.x;
        let visible_height = request.y.saturating_add(span).min(height) - request.y;
        let visible = imageops::crop_imm(
            &self.image,
            request.x as u32,
            request.y as u32,
            visible_width as u32,
            visible_height as u32,
        )
        .to_image();

        let scaled = |extent: u64| {
            (extent as f64 / step)
                .round()
                .clamp(1.0, f64::from(request.size)) as u32
        };
        let (out_width, out_height) = (scaled(visible_width), scaled(visible_height));
        let resized = if visible.dimensions() == (out_width, out_height) {
            visible
        } else {
            imageops::resize(&visible, out_width, out_height, FilterType::Triangle)
        };

        imageops::replace(&mut patch, &resized, 0, 0);
        Ok(patch)
    }
}
