//! Main application state and service coordination
//!
//! This module wires the concrete sources, matcher, converter and cache into
//! the orchestrator. All dependencies are injected at construction time; a
//! missing or unbuildable dependency fails construction, never a run.

use crate::cache::TtlCache;
use crate::config::scoring::ScoringSettings;
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::matching::{MatchingConfig, TieredPlayerMatcher};
use crate::metrics::MetricsCollector;
use crate::pipeline::{IntegrationPipeline, PipelineConfig, PipelineStats};
use crate::scoring::ScoreConverter;
use crate::sources::{
    LeagueApiSource, PredictionApiSource, PredictionSource, RosterSource, RulesetSource,
};
use crate::types::{IntegrationReport, RunOptions};
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Production application state
pub struct AppState {
    config: AppConfig,
    cache: Arc<TtlCache>,
    metrics: Arc<MetricsCollector>,
    pipeline: Arc<IntegrationPipeline>,
    started_at: Instant,
    running: RwLock<bool>,
}

impl AppState {
    /// Build the full production wiring: HTTP source adapters against the
    /// configured upstreams, the tiered matcher and the score converter.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let league = Arc::new(LeagueApiSource::new(&config.sources)?);
        let predictions = Arc::new(PredictionApiSource::new(&config.sources)?);

        Self::with_sources(config, league.clone(), predictions, league)
    }

    /// Build with explicit sources; the injection seam used by tests and the
    /// pipeline-tester binary.
    pub fn with_sources(
        config: AppConfig,
        roster_source: Arc<dyn RosterSource>,
        prediction_source: Arc<dyn PredictionSource>,
        ruleset_source: Arc<dyn RulesetSource>,
    ) -> Result<Self> {
        let scoring = ScoringSettings::default();
        scoring.validate()?;

        let cache = Arc::new(TtlCache::new());
        let metrics = Arc::new(MetricsCollector::new()?);

        let pipeline_config = PipelineConfig {
            source_timeout: config.source_timeout(),
            max_concurrent_enrichments: config.pipeline.max_concurrent_enrichments,
            matching: MatchingConfig {
                allow_heuristics: config.pipeline.allow_heuristic_matching,
            },
            default_ruleset: config.pipeline.default_ruleset.clone(),
        };

        let pipeline = Arc::new(IntegrationPipeline::new(
            roster_source,
            prediction_source,
            ruleset_source,
            Arc::new(TieredPlayerMatcher::new()),
            ScoreConverter::new(scoring),
            cache.clone(),
            metrics.clone(),
            pipeline_config,
        ));

        info!("Application state initialized");

        Ok(Self {
            config,
            cache,
            metrics,
            pipeline,
            started_at: Instant::now(),
            running: RwLock::new(false),
        })
    }

    /// Mark the service as started
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.write().await;
        *running = true;
        info!("Service components started");
        Ok(())
    }

    /// Mark the service as stopped
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.write().await;
        *running = false;
        info!("Service components stopped");
        Ok(())
    }

    /// Whether the service is accepting work
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Execute one integration run and refresh derived gauges
    pub async fn run_integration(
        &self,
        options: RunOptions,
    ) -> Result<IntegrationReport, PipelineError> {
        debug!("Integration run requested: {:?}", options);

        let result = self.pipeline.run(options).await;

        self.metrics.update_cache_stats(&self.cache.stats());
        self.metrics.update_uptime(self.uptime());

        result
    }

    /// Snapshot of pipeline statistics
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn cache(&self) -> Arc<TtlCache> {
        self.cache.clone()
    }

    /// Time since construction
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockPredictionSource, MockRosterSource, MockRulesetSource};

    fn mock_app_state() -> AppState {
        AppState::with_sources(
            AppConfig::default(),
            Arc::new(MockRosterSource::new()),
            Arc::new(MockPredictionSource::new()),
            Arc::new(MockRulesetSource::new()),
        )
        .expect("app state")
    }

    #[tokio::test]
    async fn test_lifecycle_flags() {
        let state = mock_app_state();
        assert!(!state.is_running().await);

        state.start().await.unwrap();
        assert!(state.is_running().await);

        state.stop().await.unwrap();
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn test_run_integration_surfaces_pipeline_errors() {
        let state = mock_app_state();

        // Empty mock sources: the run must fail fast, not return partial data
        let err = state.run_integration(RunOptions::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_stats_start_empty() {
        let state = mock_app_state();
        let stats = state.pipeline_stats();
        assert_eq!(stats.runs_completed, 0);
        assert!(stats.last_run_at.is_none());
    }
}
