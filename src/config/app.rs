//! Main application configuration
//!
//! This module defines the primary configuration structures for the scout-room
//! integration service, including environment variable loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub sources: SourceSettings,
    pub pipeline: PipelineSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the health/trigger endpoint
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Upstream source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Base URL for the fantasy-league platform API
    pub league_base_url: String,
    /// Base URL for the prediction provider API
    pub prediction_base_url: String,
    /// Per-call timeout for upstream fetches in seconds
    pub request_timeout_seconds: u64,
    /// User-Agent header sent upstream
    pub user_agent: String,
}

/// Pipeline-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Maximum concurrent per-player enrichment tasks
    pub max_concurrent_enrichments: usize,
    /// Whether the name+team heuristic fallback is allowed
    pub allow_heuristic_matching: bool,
    /// Target ruleset applied when the trigger does not name one
    pub default_ruleset: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            sources: SourceSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "scout-room".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            league_base_url: "https://league.example.com/api/v1".to_string(),
            prediction_base_url: "https://predictions.example.com/api".to_string(),
            request_timeout_seconds: 5,
            user_agent: "scout-room/0.1".to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_enrichments: 8,
            allow_heuristic_matching: true,
            default_ruleset: "classic".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Source settings
        if let Ok(url) = env::var("LEAGUE_BASE_URL") {
            config.sources.league_base_url = url;
        }
        if let Ok(url) = env::var("PREDICTION_BASE_URL") {
            config.sources.prediction_base_url = url;
        }
        if let Ok(timeout) = env::var("SOURCE_TIMEOUT_SECONDS") {
            config.sources.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SOURCE_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(ua) = env::var("SOURCE_USER_AGENT") {
            config.sources.user_agent = ua;
        }

        // Pipeline settings
        if let Ok(max) = env::var("MAX_CONCURRENT_ENRICHMENTS") {
            config.pipeline.max_concurrent_enrichments = max
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_CONCURRENT_ENRICHMENTS value: {}", max))?;
        }
        if let Ok(allow) = env::var("ALLOW_HEURISTIC_MATCHING") {
            config.pipeline.allow_heuristic_matching = allow
                .parse()
                .map_err(|_| anyhow!("Invalid ALLOW_HEURISTIC_MATCHING value: {}", allow))?;
        }
        if let Ok(ruleset) = env::var("DEFAULT_RULESET") {
            config.pipeline.default_ruleset = ruleset;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the upstream request timeout as Duration
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.sources.request_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.sources.request_timeout_seconds == 0 {
        return Err(anyhow!("Source request timeout must be greater than 0"));
    }
    if config.sources.request_timeout_seconds > 30 {
        return Err(anyhow!(
            "Source request timeout must stay within fail-fast bounds (<= 30s)"
        ));
    }

    // Validate source URLs
    if config.sources.league_base_url.is_empty() {
        return Err(anyhow!("League base URL cannot be empty"));
    }
    if config.sources.prediction_base_url.is_empty() {
        return Err(anyhow!("Prediction base URL cannot be empty"));
    }

    // Validate pipeline settings
    if config.pipeline.max_concurrent_enrichments == 0 {
        return Err(anyhow!("Max concurrent enrichments must be greater than 0"));
    }
    if config.pipeline.default_ruleset.is_empty() {
        return Err(anyhow!("Default ruleset cannot be empty"));
    }

    Ok(())
}
