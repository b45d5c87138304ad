//! Integration pipeline orchestration
//!
//! Sequences fetch, match, convert and assemble stages with fail-fast
//! semantics, consulting and populating the cache at each expensive step.

pub mod orchestrator;

pub use orchestrator::{IntegrationPipeline, PipelineConfig, PipelineStats};
