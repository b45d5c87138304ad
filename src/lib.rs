//! Scout Room - Player prediction integration for fantasy football leagues
//!
//! This crate aggregates player predictions from an external provider and
//! roster/ownership data from a fantasy-league platform, reconciles the two
//! player identity spaces, converts points between scoring rulesets, and
//! serves the merged, cached result.

pub mod cache;
pub mod config;
pub mod error;
pub mod matching;
pub mod metrics;
pub mod pipeline;
pub mod position;
pub mod scoring;
pub mod service;
pub mod sources;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{PipelineError, Result};
pub use types::*;

// Re-export key components
pub use cache::TtlCache;
pub use matching::{PlayerMatcher, TieredPlayerMatcher};
pub use pipeline::{IntegrationPipeline, PipelineConfig};
pub use scoring::ScoreConverter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
