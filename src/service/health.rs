//! Health check functionality
//!
//! This module provides health checks for the scout-room integration service,
//! including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional detail message
    pub message: Option<String>,
}

/// Service statistics included in health responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub players_enriched: u64,
    pub last_match_rate: f64,
    pub cache_entries: usize,
    pub uptime_info: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

impl HealthCheck {
    /// Full health check with per-component detail
    pub async fn check(app_state: Arc<AppState>) -> Result<HealthCheck> {
        debug!("Running full health check");

        let mut checks = Vec::new();

        // Service lifecycle
        let running = app_state.is_running().await;
        checks.push(ComponentCheck {
            name: "service".to_string(),
            status: if running {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: (!running).then(|| "service not started".to_string()),
        });

        // Cache is always available in-process; report its size for context
        let cache_stats = app_state.cache().stats();
        checks.push(ComponentCheck {
            name: "cache".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!(
                "{} entries, {} hits, {} misses",
                cache_stats.entries, cache_stats.hits, cache_stats.misses
            )),
        });

        // Pipeline health follows recent run outcomes
        let stats = app_state.pipeline_stats();
        let pipeline_status = if stats.runs_completed == 0 && stats.runs_failed == 0 {
            HealthStatus::Healthy
        } else if stats.runs_failed > 0 && stats.runs_completed == 0 {
            HealthStatus::Unhealthy
        } else if stats.runs_failed > stats.runs_completed {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        checks.push(ComponentCheck {
            name: "pipeline".to_string(),
            status: pipeline_status,
            message: Some(format!(
                "{} completed, {} failed",
                stats.runs_completed, stats.runs_failed
            )),
        });

        let metrics = app_state.metrics();
        let status = overall_status(&checks);
        metrics.update_health_status(match status {
            HealthStatus::Unhealthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Healthy => 2,
        });
        for check in &checks {
            metrics.update_component_health(&check.name, check.status == HealthStatus::Healthy);
        }

        let uptime = app_state.uptime();
        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: crate::utils::current_timestamp(),
            checks,
            stats: ServiceStats {
                runs_completed: stats.runs_completed,
                runs_failed: stats.runs_failed,
                players_enriched: stats.players_enriched,
                last_match_rate: stats.last_match_rate,
                cache_entries: cache_stats.entries,
                uptime_info: format_uptime(uptime.as_secs()),
            },
        })
    }

    /// Lightweight liveness probe
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        Ok(if app_state.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        })
    }

    /// Readiness probe: ready once started, degraded while runs keep failing
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        let stats = app_state.pipeline_stats();
        Ok(
            if stats.runs_failed > 0 && stats.runs_completed == 0 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
        )
    }
}

fn overall_status(checks: &[ComponentCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

fn format_uptime(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::sources::{MockPredictionSource, MockRosterSource, MockRulesetSource};

    fn mock_app_state() -> Arc<AppState> {
        Arc::new(
            AppState::with_sources(
                AppConfig::default(),
                Arc::new(MockRosterSource::new()),
                Arc::new(MockPredictionSource::new()),
                Arc::new(MockRulesetSource::new()),
            )
            .expect("app state"),
        )
    }

    #[tokio::test]
    async fn test_unhealthy_before_start() {
        let state = mock_app_state();
        let status = HealthCheck::liveness_check(state).await.unwrap();
        assert_eq!(status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_healthy_after_start() {
        let state = mock_app_state();
        state.start().await.unwrap();

        let health = HealthCheck::check(state).await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.stats.runs_completed, 0);
        assert!(health.checks.iter().any(|c| c.name == "cache"));
    }

    #[tokio::test]
    async fn test_readiness_degrades_after_failed_runs() {
        let state = mock_app_state();
        state.start().await.unwrap();

        // Empty mock sources make the run fail
        let _ = state
            .run_integration(crate::types::RunOptions::default())
            .await;

        let status = HealthCheck::readiness_check(state).await.unwrap();
        assert_eq!(status, HealthStatus::Degraded);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
