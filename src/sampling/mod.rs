//! Sampling core
//!
//! This module contains:
//! - Source capabilities consumed by the sampler
//! - Seed planning from coarse class grids
//! - Candidate evaluation and per-class quotas
//! - Run orchestration and the resulting patch frame

/// Candidate accept/reject policy
pub mod evaluator;
/// Patch records and the columnar patch frame
pub mod frame;
/// Per-class quota accounting
pub mod quota;
/// Two-phase sampler
pub mod sampler;
/// Seed planning
pub mod seeds;
/// Slide, mask and label capabilities
pub mod sources;

pub use sampler::Sampler;
