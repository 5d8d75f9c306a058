//! Error types for patch sampling, mask loading and patch frame persistence

use std::fmt;
use std::path::PathBuf;

use crate::sampling::sources::ClassLabel;

/// Main error type for all sampling operations
#[derive(Debug)]
pub enum SamplingError {
    /// Failed to load a slide or mask image from the filesystem
    ImageLoad {
        /// Slide or mask file
        path: PathBuf,
        /// Decoder failure
        source: image::ImageError,
    },

    /// Failed to write an exported patch image
    ImageExport {
        /// Destination of the patch image
        path: PathBuf,
        /// Encoder failure
        source: image::ImageError,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Parameter name
        parameter: &'static str,
        /// Rejected value
        value: String,
        /// Accepted range or form
        reason: String,
    },

    /// Annotation label grid has no unannotated (`0`) class
    ///
    /// Every annotation mask must map its unlabelled area to class `0`.
    /// The run is aborted before any patch is read.
    MissingUnannotatedClass {
        /// Smallest label found, `None` for an empty grid
        smallest: Option<ClassLabel>,
    },

    /// Label reader has no pixel value for a class
    UnknownLabel {
        /// Class that could not be translated
        class: ClassLabel,
    },

    /// A required mask could not be found for a slide
    MissingMask {
        /// Kind of mask ("tissue", "annotation")
        kind: &'static str,
        /// Slide the mask was looked up for
        slide_id: String,
        /// Directory that was searched
        search_dir: PathBuf,
    },

    /// Several files in a search directory could belong to one slide
    AmbiguousMatch {
        /// Slide the files were looked up for
        slide_id: String,
        /// Candidates that matched equally well, sorted
        candidates: Vec<PathBuf>,
    },

    /// `sample` was called without a fresh `prepare`
    NotPrepared {
        /// Slide the sampler belongs to
        slide_id: String,
    },

    /// Reading, writing or listing a path failed
    FileSystem {
        /// Path being accessed
        path: PathBuf,
        /// What was being done
        operation: &'static str,
        /// I/O failure
        source: std::io::Error,
    },

    /// Failed to encode or decode a JSON document
    Serialization {
        /// Path of the document
        path: PathBuf,
        /// Underlying serde error
        source: serde_json::Error,
    },
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Cannot decode '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Cannot write patch image '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::MissingUnannotatedClass { smallest } => match smallest {
                Some(label) => write!(
                    f,
                    "Annotation mask has no unannotated class 0 (smallest label is {label})"
                ),
                None => write!(f, "Annotation mask has no unannotated class 0 (mask is empty)"),
            },
            Self::UnknownLabel { class } => {
                write!(f, "No pixel value is defined for class {class}")
            }
            Self::MissingMask {
                kind,
                slide_id,
                search_dir,
            } => {
                write!(
                    f,
                    "No {kind} mask for slide '{slide_id}' in '{}'",
                    search_dir.display()
                )
            }
            Self::AmbiguousMatch {
                slide_id,
                candidates,
            } => {
                let names: Vec<String> = candidates
                    .iter()
                    .map(|path| format!("'{}'", path.display()))
                    .collect();
                write!(
                    f,
                    "Several files could belong to slide '{slide_id}': {}",
                    names.join(", ")
                )
            }
            Self::NotPrepared { slide_id } => {
                write!(
                    f,
                    "Sampler for slide '{slide_id}' must be prepared before each sampling run"
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "Cannot {operation} '{}': {source}",
                    path.display()
                )
            }
            Self::Serialization { path, source } => {
                write!(f, "Invalid JSON in '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SamplingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for sampling results
pub type Result<T> = std::result::Result<T, SamplingError>;

impl From<std::io::Error> for SamplingError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Shorthand for [`SamplingError::InvalidParameter`]
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SamplingError {
    SamplingError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a file system error bound to a path
pub fn file_system(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> SamplingError {
    SamplingError::FileSystem {
        path: path.into(),
        operation,
        source,
    }
}
