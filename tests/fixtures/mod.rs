//! Test fixtures and builders for integration testing

use scout_room::scoring::ruleset::{provider_basis, CategoryWeights, RulesetWeights};
use scout_room::sources::{MockPredictionSource, MockRosterSource, MockRulesetSource};
use scout_room::types::{GameweekPrediction, GameweekStatus, PredictedPlayer, RosterPlayer};
use std::sync::Arc;

/// Build a roster player with sensible defaults
pub fn roster_player(id: &str, name: &str, team: &str, opta_id: Option<&str>) -> RosterPlayer {
    RosterPlayer {
        id: id.to_string(),
        name: name.to_string(),
        position_codes: vec!["M".to_string()],
        position: None,
        team: team.to_string(),
        owner: Some("mgr-1".to_string()),
        opta_id: opta_id.map(String::from),
    }
}

/// Build a predicted player with a settled week one and forecast weeks after
pub fn predicted_player(
    id: &str,
    name: &str,
    team: &str,
    opta_id: Option<&str>,
    points_per_week: f64,
) -> PredictedPlayer {
    let gameweeks: Vec<GameweekPrediction> = (1..=4)
        .map(|gameweek| GameweekPrediction {
            gameweek,
            points: points_per_week,
            minutes: 90.0,
            status: if gameweek == 1 {
                GameweekStatus::Settled
            } else {
                GameweekStatus::Forecast
            },
        })
        .collect();

    PredictedPlayer {
        id: id.to_string(),
        name: name.to_string(),
        position_class: Some(3),
        team: team.to_string(),
        opta_id: opta_id.map(String::from),
        season_points: points_per_week * 38.0,
        gameweeks,
    }
}

/// A matched trio of mock sources preloaded with one cleanly-linked player
pub fn linked_sources() -> (
    Arc<MockRosterSource>,
    Arc<MockPredictionSource>,
    Arc<MockRulesetSource>,
) {
    let rosters = Arc::new(MockRosterSource::with_players(vec![roster_player(
        "r1",
        "A. Smith",
        "ABC",
        Some("X1"),
    )]));
    let predictions = Arc::new(MockPredictionSource::with_players(vec![predicted_player(
        "p1",
        "Andrew Smith",
        "ABC",
        Some("X1"),
        5.0,
    )]));
    let ruleset = Arc::new(MockRulesetSource::with_weights(provider_basis()));

    (rosters, predictions, ruleset)
}

/// A target ruleset whose forward table defines only goals, inflated 10% over
/// the provider basis; the other categories are absent and contribute nothing
pub fn inflated_forward_ruleset() -> RulesetWeights {
    let mut weights = provider_basis();
    weights.name = "inflated".to_string();
    weights.forward = CategoryWeights {
        goals: Some(4.4),
        assists: None,
        clean_sheets: None,
        cards: None,
    };
    weights
}
