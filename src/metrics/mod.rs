//! Metrics and monitoring for the scout-room integration service
//!
//! This module provides metrics collection, health monitoring and the HTTP
//! surface (health, metrics, stats and the integration trigger).

pub mod collector;
pub mod health;

pub use collector::{
    CacheMetrics, MatchMetrics, MetricsCollector, PipelineMetrics, ServiceMetrics, SourceMetrics,
};
pub use health::{HealthServer, HealthServerConfig};
