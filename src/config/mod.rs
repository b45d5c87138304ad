//! Configuration management for the scout-room service
//!
//! This module handles all configuration loading from environment variables,
//! TOML files, validation, and default values for the integration pipeline.

pub mod app;
pub mod scoring;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, PipelineSettings, ServiceSettings, SourceSettings,
};
pub use scoring::ScoringSettings;
