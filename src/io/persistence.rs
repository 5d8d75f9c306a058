//! Patch frame files and optional export of accepted patch pixels

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::io::configuration::{PATCHFRAME_EXTENSION, PATCHFRAME_SUFFIX};
use crate::io::error::{Result, SamplingError, file_system, invalid_parameter};
use crate::sampling::frame::PatchFrame;
use crate::sampling::sources::{PatchRequest, SlideSource};

/// Location of a slide's patch frame inside `dir`
pub fn patchframe_path(dir: &Path, slide_id: &str) -> PathBuf {
    dir.join(format!(
        "{slide_id}{PATCHFRAME_SUFFIX}.{PATCHFRAME_EXTENSION}"
    ))
}

/// Write a patch frame as `<dir>/<slide_id>_patchframe.json`
///
/// The directory is created if absent and an existing file is replaced.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The file cannot be written
pub fn save_patchframe(frame: &PatchFrame, dir: &Path, slide_id: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| file_system(dir, "create directory", e))?;

    let path = patchframe_path(dir, slide_id);
    log::info!("Saving patchframe to {}", path.display());

    let file = File::create(&path).map_err(|e| file_system(&path, "create file", e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, frame).map_err(|e| {
        SamplingError::Serialization {
            path: path.clone(),
            source: e,
        }
    })?;
    writer
        .flush()
        .map_err(|e| file_system(&path, "write file", e))?;

    Ok(path)
}

/// Read a patch frame written by [`save_patchframe`]
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The content is not a patch frame
/// - The columns have different lengths
pub fn load_patchframe(path: &Path) -> Result<PatchFrame> {
    let file = File::open(path).map_err(|e| file_system(path, "open file", e))?;
    let frame: PatchFrame =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            SamplingError::Serialization {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

    if !frame.is_consistent() {
        return Err(invalid_parameter(
            "patchframe",
            &path.display(),
            &"columns have different lengths",
        ));
    }

    Ok(frame)
}

/// Write the pixels of every accepted patch as PNG
///
/// Files land in `<dir>/<slide_id>/<class>/<slide_id>_<w>_<h>.png`.
/// Returns the number of images written.
///
/// # Errors
///
/// Returns an error if a patch cannot be read from the slide or written
pub fn export_patch_images(slide: &dyn SlideSource, frame: &PatchFrame, dir: &Path) -> Result<usize> {
    let mut written = 0;

    for record in frame.records() {
        let class_dir = dir.join(&record.slide_id).join(record.class.to_string());
        fs::create_dir_all(&class_dir)
            .map_err(|e| file_system(&class_dir, "create directory", e))?;

        let request = PatchRequest {
            x: record.x,
            y: record.y,
            magnification: record.magnification,
            size: record.size,
        };
        let patch = slide.read_patch(&request)?;

        let path = class_dir.join(format!(
            "{}_{}_{}.png",
            record.slide_id, record.x, record.y
        ));
        patch
            .save(&path)
            .map_err(|e| SamplingError::ImageExport {
                path: path.clone(),
                source: e,
            })?;
        written += 1;
    }

    Ok(written)
}
