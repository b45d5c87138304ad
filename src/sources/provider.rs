//! Source provider interfaces and mock implementations
//!
//! These traits are the seams the orchestrator is constructed against; the
//! HTTP adapters and the mocks below are interchangeable behind them.

use crate::scoring::ruleset::RulesetWeights;
use crate::types::{PredictedPlayer, RosterPlayer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Provider of roster/ownership data from the league platform
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Short source name used in logs, metrics and error reports
    fn name(&self) -> &str;

    /// Fetch the current roster collection with ownership.
    ///
    /// An empty collection on success is indistinguishable from a soft
    /// failure; the orchestrator treats it as one.
    async fn fetch_rosters(&self) -> crate::error::Result<Vec<RosterPlayer>>;
}

/// Provider of per-gameweek prediction data
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Short source name used in logs, metrics and error reports
    fn name(&self) -> &str;

    /// Fetch the current prediction collection
    async fn fetch_predictions(&self) -> crate::error::Result<Vec<PredictedPlayer>>;
}

/// Provider of the target ruleset's scoring-weight table
#[async_trait]
pub trait RulesetSource: Send + Sync {
    /// Fetch the live weight table for the named ruleset.
    ///
    /// On failure the converter falls back to hardcoded defaults; this call
    /// failing is degraded-but-functional, never fatal.
    async fn fetch_weights(&self, ruleset: &str) -> crate::error::Result<RulesetWeights>;
}

/// Mock roster source for testing and development
#[derive(Debug, Default)]
pub struct MockRosterSource {
    players: RwLock<Vec<RosterPlayer>>,
    failing: RwLock<bool>,
    fetch_calls: AtomicU64,
}

impl MockRosterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock preloaded with players
    pub fn with_players(players: Vec<RosterPlayer>) -> Self {
        let source = Self::new();
        source.set_players(players);
        source
    }

    /// Replace the players returned by subsequent fetches
    pub fn set_players(&self, players: Vec<RosterPlayer>) {
        if let Ok(mut guard) = self.players.write() {
            *guard = players;
        }
    }

    /// Make subsequent fetches fail (simulates an unavailable upstream)
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut guard) = self.failing.write() {
            *guard = failing;
        }
    }

    /// Number of fetch calls made (for testing)
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RosterSource for MockRosterSource {
    fn name(&self) -> &str {
        "mock-league"
    }

    async fn fetch_rosters(&self) -> crate::error::Result<Vec<RosterPlayer>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);

        if self.failing.read().map(|f| *f).unwrap_or(false) {
            return Err(anyhow::anyhow!("mock roster source failure"));
        }

        Ok(self
            .players
            .read()
            .map(|players| players.clone())
            .unwrap_or_default())
    }
}

/// Mock prediction source for testing and development
#[derive(Debug, Default)]
pub struct MockPredictionSource {
    players: RwLock<Vec<PredictedPlayer>>,
    failing: RwLock<bool>,
    fetch_calls: AtomicU64,
}

impl MockPredictionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock preloaded with predicted players
    pub fn with_players(players: Vec<PredictedPlayer>) -> Self {
        let source = Self::new();
        source.set_players(players);
        source
    }

    /// Replace the players returned by subsequent fetches
    pub fn set_players(&self, players: Vec<PredictedPlayer>) {
        if let Ok(mut guard) = self.players.write() {
            *guard = players;
        }
    }

    /// Make subsequent fetches fail (simulates an unavailable upstream)
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut guard) = self.failing.write() {
            *guard = failing;
        }
    }

    /// Number of fetch calls made (for testing)
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PredictionSource for MockPredictionSource {
    fn name(&self) -> &str {
        "mock-predictions"
    }

    async fn fetch_predictions(&self) -> crate::error::Result<Vec<PredictedPlayer>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);

        if self.failing.read().map(|f| *f).unwrap_or(false) {
            return Err(anyhow::anyhow!("mock prediction source failure"));
        }

        Ok(self
            .players
            .read()
            .map(|players| players.clone())
            .unwrap_or_default())
    }
}

/// Mock ruleset source for testing and development
#[derive(Debug, Default)]
pub struct MockRulesetSource {
    weights: RwLock<Option<RulesetWeights>>,
    failing: RwLock<bool>,
}

impl MockRulesetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: RulesetWeights) -> Self {
        let source = Self::new();
        source.set_weights(weights);
        source
    }

    pub fn set_weights(&self, weights: RulesetWeights) {
        if let Ok(mut guard) = self.weights.write() {
            *guard = Some(weights);
        }
    }

    /// Make subsequent fetches fail (exercises the degraded fallback)
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut guard) = self.failing.write() {
            *guard = failing;
        }
    }
}

#[async_trait]
impl RulesetSource for MockRulesetSource {
    async fn fetch_weights(&self, ruleset: &str) -> crate::error::Result<RulesetWeights> {
        if self.failing.read().map(|f| *f).unwrap_or(false) {
            return Err(anyhow::anyhow!("mock ruleset source failure"));
        }

        self.weights
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| anyhow::anyhow!("no weights configured for ruleset '{}'", ruleset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_roster_player(id: &str) -> RosterPlayer {
        RosterPlayer {
            id: id.to_string(),
            name: format!("Player {}", id),
            position_codes: vec!["M".to_string()],
            position: None,
            team: "ABC".to_string(),
            owner: None,
            opta_id: None,
        }
    }

    #[tokio::test]
    async fn test_mock_roster_source_returns_players() {
        let source = MockRosterSource::with_players(vec![test_roster_player("p1")]);

        let players = source.fetch_rosters().await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(source.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_roster_source_failure_toggle() {
        let source = MockRosterSource::with_players(vec![test_roster_player("p1")]);

        source.set_failing(true);
        assert!(source.fetch_rosters().await.is_err());

        source.set_failing(false);
        assert!(source.fetch_rosters().await.is_ok());
        assert_eq!(source.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_prediction_source_empty_by_default() {
        let source = MockPredictionSource::new();
        let players = source.fetch_predictions().await.unwrap();
        assert!(players.is_empty());
    }

    #[tokio::test]
    async fn test_mock_ruleset_source() {
        let source = MockRulesetSource::new();
        assert!(source.fetch_weights("classic").await.is_err());

        source.set_weights(crate::scoring::ruleset::default_target());
        let weights = source.fetch_weights("classic").await.unwrap();
        assert_eq!(weights.name, "default-target");

        source.set_failing(true);
        assert!(source.fetch_weights("classic").await.is_err());
    }
}
