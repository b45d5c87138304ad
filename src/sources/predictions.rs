//! Prediction provider adapter
//!
//! Fetches per-gameweek point predictions. Each gameweek record carries an
//! indicator of whether it is a forward-looking forecast or a settled result;
//! the converter treats settled records as ground truth.

use crate::config::app::SourceSettings;
use crate::sources::provider::PredictionSource;
use crate::sources::IdValue;
use crate::types::{GameweekPrediction, GameweekStatus, PredictedPlayer};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// HTTP adapter for the prediction provider
#[derive(Debug, Clone)]
pub struct PredictionApiSource {
    client: reqwest::Client,
    base_url: String,
}

impl PredictionApiSource {
    /// Build the adapter with its own pooled client
    pub fn new(settings: &SourceSettings) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(std::time::Duration::from_secs(
                settings.request_timeout_seconds,
            ))
            .build()
            .context("Failed to build prediction HTTP client")?;

        Ok(Self {
            client,
            base_url: settings
                .prediction_base_url
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl PredictionSource for PredictionApiSource {
    fn name(&self) -> &str {
        "predictions"
    }

    async fn fetch_predictions(&self) -> crate::error::Result<Vec<PredictedPlayer>> {
        let url = format!("{}/players", self.base_url);
        debug!("Fetching predictions from {}", url);

        let response: PredictionResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Prediction request failed")?
            .error_for_status()
            .context("Prediction request returned an error status")?
            .json()
            .await
            .context("Prediction response was not valid JSON")?;

        let players = response
            .into_players()
            .into_iter()
            .map(RawPredictedPlayer::into_predicted_player)
            .collect();

        Ok(players)
    }
}

/// Prediction collection, wrapped or bare depending on the endpoint version
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionResponse {
    Wrapped { players: Vec<RawPredictedPlayer> },
    Bare(Vec<RawPredictedPlayer>),
}

impl PredictionResponse {
    fn into_players(self) -> Vec<RawPredictedPlayer> {
        match self {
            PredictionResponse::Wrapped { players } => players,
            PredictionResponse::Bare(players) => players,
        }
    }
}

/// One predicted player as the provider serializes it
#[derive(Debug, Deserialize)]
struct RawPredictedPlayer {
    id: IdValue,
    #[serde(alias = "web_name")]
    name: String,
    #[serde(default, alias = "element_type")]
    position_class: Option<u8>,
    #[serde(default, alias = "team_code")]
    team: Option<IdValue>,
    #[serde(default, alias = "code", alias = "external_id")]
    opta_id: Option<IdValue>,
    #[serde(default, alias = "events", alias = "rounds")]
    gameweeks: Vec<RawGameweek>,
    #[serde(default, alias = "season_prediction", alias = "total_pts")]
    season_points: f64,
}

/// One gameweek record as the provider serializes it
#[derive(Debug, Deserialize)]
struct RawGameweek {
    #[serde(alias = "event", alias = "round")]
    gameweek: u32,
    #[serde(default, alias = "predicted_pts", alias = "pts")]
    points: f64,
    #[serde(default, alias = "predicted_mins", alias = "mins")]
    minutes: f64,
    /// True once the gameweek has been played and this is a settled result
    #[serde(default, alias = "is_result")]
    finished: bool,
}

impl RawPredictedPlayer {
    fn into_predicted_player(self) -> PredictedPlayer {
        let gameweeks = self
            .gameweeks
            .into_iter()
            .map(|raw| GameweekPrediction {
                gameweek: raw.gameweek,
                points: raw.points,
                minutes: raw.minutes,
                status: if raw.finished {
                    GameweekStatus::Settled
                } else {
                    GameweekStatus::Forecast
                },
            })
            .collect();

        PredictedPlayer {
            id: self.id.into_string(),
            name: self.name,
            position_class: self.position_class,
            team: self.team.map(IdValue::into_string).unwrap_or_default(),
            opta_id: self
                .opta_id
                .map(IdValue::into_string)
                .filter(|id| !id.is_empty()),
            gameweeks,
            season_points: self.season_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gameweek_status_indicator() {
        let raw: RawPredictedPlayer = serde_json::from_str(
            r#"{
                "id": 7,
                "web_name": "A. Smith",
                "element_type": 4,
                "team": "ABC",
                "code": "X1",
                "events": [
                    {"event": 1, "pts": 6.5, "mins": 90, "finished": true},
                    {"event": 2, "pts": 5.0, "mins": 85}
                ],
                "total_pts": 180.5
            }"#,
        )
        .unwrap();

        let player = raw.into_predicted_player();
        assert_eq!(player.id, "7");
        assert_eq!(player.position_class, Some(4));
        assert_eq!(player.opta_id.as_deref(), Some("X1"));
        assert_eq!(player.gameweeks.len(), 2);
        assert_eq!(player.gameweeks[0].status, GameweekStatus::Settled);
        assert_eq!(player.gameweeks[1].status, GameweekStatus::Forecast);
        assert_eq!(player.season_points, 180.5);
    }

    #[test]
    fn test_wrapped_and_bare_collections() {
        let bare: PredictionResponse =
            serde_json::from_str(r#"[{"id": 1, "name": "X", "gameweeks": []}]"#).unwrap();
        assert_eq!(bare.into_players().len(), 1);

        let wrapped: PredictionResponse =
            serde_json::from_str(r#"{"players": [{"id": 1, "name": "X"}]}"#).unwrap();
        assert_eq!(wrapped.into_players().len(), 1);
    }

    #[test]
    fn test_numeric_team_code_becomes_string() {
        let raw: RawPredictedPlayer =
            serde_json::from_str(r#"{"id": 1, "name": "X", "team_code": 14}"#).unwrap();
        assert_eq!(raw.into_predicted_player().team, "14");
    }

    #[test]
    fn test_adapter_construction() {
        let settings = SourceSettings::default();
        let source = PredictionApiSource::new(&settings).unwrap();
        assert_eq!(source.name(), "predictions");
    }
}
