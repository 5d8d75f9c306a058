/// Command-line arguments and batch processing
pub mod cli;
/// Constants, defaults and option types
pub mod configuration;
/// Per-slide file lookup
pub mod discovery;
/// Error types
pub mod error;
/// Class/pixel label readers
pub mod labels;
/// Sampler assembly from files
pub mod loader;
/// Label-grid tissue and annotation masks
pub mod masks;
/// Patch frame files and patch image export
pub mod persistence;
/// Progress bars for batch runs
pub mod progress;
/// Raster images as slides
pub mod slide;
