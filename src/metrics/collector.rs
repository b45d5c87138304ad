//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the scout-room integration
//! service using Prometheus metrics.

use crate::cache::CacheStats;
use anyhow::Result;
use prometheus::{
    Gauge, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the integration service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Pipeline run metrics
    pipeline_metrics: PipelineMetrics,

    /// Upstream source metrics
    source_metrics: SourceMetrics,

    /// Identity matching metrics
    match_metrics: MatchMetrics,

    /// Cache behavior metrics
    cache_metrics: CacheMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Pipeline run metrics
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Total integration runs by outcome
    pub runs_total: IntCounterVec,

    /// Run duration
    pub run_duration_seconds: Histogram,

    /// Reports served straight from cache
    pub reports_from_cache_total: IntCounter,

    /// Match rate of the most recent run, percent
    pub match_rate: Gauge,

    /// Runs that fell back to default target weights
    pub weights_degraded_total: IntCounter,
}

/// Upstream source metrics
#[derive(Clone)]
pub struct SourceMetrics {
    /// Source fetches by source and status
    pub fetches_total: IntCounterVec,

    /// Fetch duration by source
    pub fetch_duration_seconds: HistogramVec,

    /// Records returned by the most recent fetch per source
    pub records_fetched: IntGaugeVec,
}

/// Identity matching metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Match outcomes by method
    pub outcomes_total: IntCounterVec,
}

/// Cache behavior metrics
#[derive(Clone)]
pub struct CacheMetrics {
    pub hits: IntGauge,
    pub misses: IntGauge,
    pub evictions: IntGauge,
    pub entries: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let pipeline_metrics = PipelineMetrics::new(&registry)?;
        let source_metrics = SourceMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let cache_metrics = CacheMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            pipeline_metrics,
            source_metrics,
            match_metrics,
            cache_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get pipeline metrics
    pub fn pipeline(&self) -> &PipelineMetrics {
        &self.pipeline_metrics
    }

    /// Record a completed or failed run
    pub fn record_run(&self, outcome: &str, duration: Duration) {
        self.pipeline_metrics
            .runs_total
            .with_label_values(&[outcome])
            .inc();
        self.pipeline_metrics
            .run_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a report served straight from cache
    pub fn record_report_served_from_cache(&self) {
        self.pipeline_metrics.reports_from_cache_total.inc();
    }

    /// Update the most recent run's match rate
    pub fn set_match_rate(&self, rate: f64) {
        self.pipeline_metrics.match_rate.set(rate);
    }

    /// Record a run falling back to default target weights
    pub fn record_weights_degraded(&self) {
        self.pipeline_metrics.weights_degraded_total.inc();
    }

    /// Record one upstream fetch
    pub fn record_source_fetch(
        &self,
        source: &str,
        success: bool,
        duration: Duration,
        records: usize,
    ) {
        let status = if success { "success" } else { "error" };

        self.source_metrics
            .fetches_total
            .with_label_values(&[source, status])
            .inc();
        self.source_metrics
            .fetch_duration_seconds
            .with_label_values(&[source])
            .observe(duration.as_secs_f64());
        if success {
            self.source_metrics
                .records_fetched
                .with_label_values(&[source])
                .set(records as i64);
        }
    }

    /// Record one match outcome by method label
    pub fn record_match_outcome(&self, method: &str) {
        self.match_metrics
            .outcomes_total
            .with_label_values(&[method])
            .inc();
    }

    /// Mirror a cache stats snapshot into gauges
    pub fn update_cache_stats(&self, stats: &CacheStats) {
        self.cache_metrics.hits.set(stats.hits as i64);
        self.cache_metrics.misses.set(stats.misses as i64);
        self.cache_metrics.evictions.set(stats.evictions as i64);
        self.cache_metrics.entries.set(stats.entries as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Update service uptime
    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("scout_room_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "scout_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("scout_room_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl PipelineMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let runs_total = IntCounterVec::new(
            Opts::new("scout_room_runs_total", "Total integration runs"),
            &["outcome"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;

        let run_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "scout_room_run_duration_seconds",
                "Integration run duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        registry.register(Box::new(run_duration_seconds.clone()))?;

        let reports_from_cache_total = IntCounter::new(
            "scout_room_reports_from_cache_total",
            "Reports served straight from cache",
        )?;
        registry.register(Box::new(reports_from_cache_total.clone()))?;

        let match_rate = Gauge::new(
            "scout_room_match_rate",
            "Match rate of the most recent run (percent)",
        )?;
        registry.register(Box::new(match_rate.clone()))?;

        let weights_degraded_total = IntCounter::new(
            "scout_room_weights_degraded_total",
            "Runs that fell back to default target weights",
        )?;
        registry.register(Box::new(weights_degraded_total.clone()))?;

        Ok(Self {
            runs_total,
            run_duration_seconds,
            reports_from_cache_total,
            match_rate,
            weights_degraded_total,
        })
    }
}

impl SourceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let fetches_total = IntCounterVec::new(
            Opts::new("scout_room_source_fetches_total", "Upstream source fetches"),
            &["source", "status"],
        )?;
        registry.register(Box::new(fetches_total.clone()))?;

        let fetch_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "scout_room_source_fetch_duration_seconds",
                "Upstream fetch duration",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["source"],
        )?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;

        let records_fetched = IntGaugeVec::new(
            Opts::new(
                "scout_room_source_records_fetched",
                "Records returned by the most recent fetch",
            ),
            &["source"],
        )?;
        registry.register(Box::new(records_fetched.clone()))?;

        Ok(Self {
            fetches_total,
            fetch_duration_seconds,
            records_fetched,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let outcomes_total = IntCounterVec::new(
            Opts::new("scout_room_match_outcomes_total", "Match outcomes"),
            &["method"],
        )?;
        registry.register(Box::new(outcomes_total.clone()))?;

        Ok(Self { outcomes_total })
    }
}

impl CacheMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let hits = IntGauge::new("scout_room_cache_hits", "Cache hits")?;
        registry.register(Box::new(hits.clone()))?;

        let misses = IntGauge::new("scout_room_cache_misses", "Cache misses")?;
        registry.register(Box::new(misses.clone()))?;

        let evictions = IntGauge::new("scout_room_cache_evictions", "Cache evictions")?;
        registry.register(Box::new(evictions.clone()))?;

        let entries = IntGauge::new("scout_room_cache_entries", "Live cache entries")?;
        registry.register(Box::new(entries.clone()))?;

        Ok(Self {
            hits,
            misses,
            evictions,
            entries,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        // Test that we can access the metric groups
        let _service = collector.service();
        let _pipeline = collector.pipeline();
    }

    #[test]
    fn test_run_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_run("success", Duration::from_millis(120));
        collector.record_run("source_unavailable", Duration::from_millis(80));
        collector.set_match_rate(87.5);
        collector.record_report_served_from_cache();
        collector.record_weights_degraded();
    }

    #[test]
    fn test_source_and_match_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_source_fetch("league", true, Duration::from_millis(300), 500);
        collector.record_source_fetch("predictions", false, Duration::from_secs(5), 0);
        collector.record_match_outcome("cross-reference-id");
        collector.record_match_outcome("unmatched");
    }

    #[test]
    fn test_health_and_cache_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2);
        collector.update_component_health("cache", true);
        collector.update_component_health("league", false);
        collector.update_cache_stats(&CacheStats {
            hits: 10,
            misses: 3,
            evictions: 1,
            entries: 7,
        });
        collector.update_uptime(Duration::from_secs(60));
    }
}
