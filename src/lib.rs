//! Class-balanced patch sampling from whole-slide images
//!
//! Coarse tissue and annotation masks are turned into shuffled full-resolution
//! seed coordinates per class. Candidate patches at those seeds are accepted
//! when they are overwhelmingly tissue and, for annotated slides, pure enough
//! in their class. Accepted patches are collected into a patch frame.

#![forbid(unsafe_code)]

/// Slide, mask and label providers, persistence, configuration and the CLI
pub mod io;
/// Seed planning, candidate evaluation and sampling orchestration
pub mod sampling;

pub use io::configuration::{MaxPerClass, SamplingOptions};
pub use io::error::{Result, SamplingError};
pub use sampling::frame::{PatchFrame, PatchRecord};
pub use sampling::sampler::{Annotations, SampleOutcome, Sampler};
