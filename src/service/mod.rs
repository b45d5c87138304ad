//! Service layer for the scout-room integration service
//!
//! This module contains the main application state, component wiring and
//! health checks for the production service.

pub mod app;
pub mod health;

pub use app::AppState;
pub use health::{HealthCheck, HealthStatus};
