//! Locating per-slide files inside search directories

use std::fs;
use std::path::{Path, PathBuf};

use crate::io::error::{Result, SamplingError, file_system};

/// The file in `dir` belonging to `slide_id`
///
/// A file whose stem is the identifier is preferred. Otherwise a file belongs
/// to the slide when its stem is the identifier followed by a separator
/// (`<id>_tissue`, `<id>.mask`). An empty `extensions` accepts any file.
/// Returns `Ok(None)` if the directory does not exist or nothing matches.
///
/// # Errors
///
/// Returns an error if:
/// - An existing directory cannot be listed
/// - More than one file matches equally well, e.g. `slide_tissue.png` and
///   `slide_2_tissue.png` for slide `slide`
pub fn find_item(dir: &Path, slide_id: &str, extensions: &[&str]) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut exact = Vec::new();
    let mut separated = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| file_system(dir, "list directory", e))? {
        let path = entry
            .map_err(|e| file_system(dir, "list directory", e))?
            .path();
        let accepted = extensions.is_empty() || has_extension(&path, extensions);
        if !path.is_file() || !accepted {
            continue;
        }
        match path
            .file_stem()
            .and_then(|stem| stem_match(&stem.to_string_lossy(), slide_id))
        {
            Some(StemMatch::Exact) => exact.push(path),
            Some(StemMatch::Separated) => separated.push(path),
            None => {}
        }
    }

    let mut candidates = if exact.is_empty() { separated } else { exact };
    candidates.sort();
    if candidates.len() > 1 {
        return Err(SamplingError::AmbiguousMatch {
            slide_id: slide_id.to_string(),
            candidates,
        });
    }
    Ok(candidates.pop())
}

enum StemMatch {
    Exact,
    Separated,
}

fn stem_match(stem: &str, slide_id: &str) -> Option<StemMatch> {
    let rest = stem.strip_prefix(slide_id)?;
    match rest.chars().next() {
        None => Some(StemMatch::Exact),
        Some(separator) if !separator.is_ascii_alphanumeric() => Some(StemMatch::Separated),
        Some(_) => None,
    }
}

/// Files in `dir` with one of `extensions` (case-insensitive), sorted
///
/// # Errors
///
/// Returns an error if the directory cannot be listed
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| file_system(dir, "list directory", e))? {
        let path = entry
            .map_err(|e| file_system(dir, "list directory", e))?
            .path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Whether the file extension is one of `extensions` (case-insensitive)
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
}
