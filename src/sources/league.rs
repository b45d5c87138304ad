//! League platform adapter
//!
//! Fetches roster/ownership data and the live scoring-weight table from the
//! fantasy-league platform. The platform's wire format is loosely shaped (the
//! same logical field is reachable under several names, and collections
//! arrive either bare or wrapped), so everything is mapped into the canonical
//! shape here and nowhere else.

use crate::config::app::SourceSettings;
use crate::position::map_position_code;
use crate::scoring::ruleset::{CategoryWeights, RulesetWeights};
use crate::sources::provider::{RosterSource, RulesetSource};
use crate::sources::IdValue;
use crate::types::{Position, RosterPlayer};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Owner values the platform uses as its "unowned" sentinel
const UNOWNED_SENTINELS: [&str; 3] = ["", "0", "FA"];

/// HTTP adapter for the fantasy-league platform
#[derive(Debug, Clone)]
pub struct LeagueApiSource {
    client: reqwest::Client,
    base_url: String,
}

impl LeagueApiSource {
    /// Build the adapter with its own pooled client.
    ///
    /// Client construction failure is a construction-time error, surfaced
    /// before the service starts.
    pub fn new(settings: &SourceSettings) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(std::time::Duration::from_secs(
                settings.request_timeout_seconds,
            ))
            .build()
            .context("Failed to build league HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.league_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RosterSource for LeagueApiSource {
    fn name(&self) -> &str {
        "league"
    }

    async fn fetch_rosters(&self) -> crate::error::Result<Vec<RosterPlayer>> {
        let url = format!("{}/players", self.base_url);
        debug!("Fetching rosters from {}", url);

        let response: RosterResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("League roster request failed")?
            .error_for_status()
            .context("League roster request returned an error status")?
            .json()
            .await
            .context("League roster response was not valid JSON")?;

        let players = response
            .into_players()
            .into_iter()
            .map(RawLeaguePlayer::into_roster_player)
            .collect();

        Ok(players)
    }
}

#[async_trait]
impl RulesetSource for LeagueApiSource {
    async fn fetch_weights(&self, ruleset: &str) -> crate::error::Result<RulesetWeights> {
        let url = format!("{}/rulesets/{}/weights", self.base_url, ruleset);
        debug!("Fetching ruleset weights from {}", url);

        let raw: RawWeightTable = self
            .client
            .get(&url)
            .send()
            .await
            .context("Ruleset weights request failed")?
            .error_for_status()
            .context("Ruleset weights request returned an error status")?
            .json()
            .await
            .context("Ruleset weights response was not valid JSON")?;

        Ok(raw.into_ruleset(ruleset))
    }
}

/// Roster collection, wrapped or bare depending on the endpoint version
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterResponse {
    Wrapped { players: Vec<RawLeaguePlayer> },
    Bare(Vec<RawLeaguePlayer>),
}

impl RosterResponse {
    fn into_players(self) -> Vec<RawLeaguePlayer> {
        match self {
            RosterResponse::Wrapped { players } => players,
            RosterResponse::Bare(players) => players,
        }
    }
}

/// One roster player as the platform serializes it
#[derive(Debug, Deserialize)]
struct RawLeaguePlayer {
    #[serde(alias = "player_id")]
    id: IdValue,
    #[serde(alias = "full_name", alias = "display_name")]
    name: String,
    #[serde(default, alias = "positions", alias = "eligible_positions")]
    position_codes: Vec<String>,
    #[serde(default, alias = "primary_position")]
    position: Option<String>,
    #[serde(default, alias = "team_abbr", alias = "pro_team")]
    team: Option<String>,
    #[serde(default, alias = "owner_id", alias = "manager_id")]
    owner: Option<IdValue>,
    #[serde(default, alias = "external_id")]
    opta_id: Option<IdValue>,
}

impl RawLeaguePlayer {
    /// Normalize into the canonical shape, mapping the platform's unowned
    /// sentinels to absence.
    fn into_roster_player(self) -> RosterPlayer {
        let owner = self
            .owner
            .map(IdValue::into_string)
            .filter(|owner| !UNOWNED_SENTINELS.contains(&owner.as_str()));

        let opta_id = self
            .opta_id
            .map(IdValue::into_string)
            .filter(|id| !id.is_empty());

        RosterPlayer {
            id: self.id.into_string(),
            name: self.name,
            position_codes: self.position_codes,
            position: self.position,
            team: self.team.unwrap_or_default(),
            owner,
            opta_id,
        }
    }
}

/// Weight table as the platform serializes it: category -> position code -> value
#[derive(Debug, Deserialize)]
struct RawWeightTable {
    #[serde(default)]
    goals: HashMap<String, f64>,
    #[serde(default)]
    assists: HashMap<String, f64>,
    #[serde(default, alias = "cleanSheets", alias = "clean_sheet")]
    clean_sheets: HashMap<String, f64>,
    #[serde(default)]
    cards: HashMap<String, f64>,
}

impl RawWeightTable {
    fn into_ruleset(self, name: &str) -> RulesetWeights {
        let lookup = |table: &HashMap<String, f64>, position: Position| {
            table
                .iter()
                .find(|(code, _)| map_position_code(code) == Some(position))
                .map(|(_, value)| *value)
        };

        let weights_for = |position: Position| CategoryWeights {
            goals: lookup(&self.goals, position),
            assists: lookup(&self.assists, position),
            clean_sheets: lookup(&self.clean_sheets, position),
            cards: lookup(&self.cards, position),
        };

        RulesetWeights {
            name: name.to_string(),
            goalkeeper: weights_for(Position::Goalkeeper),
            defender: weights_for(Position::Defender),
            midfielder: weights_for(Position::Midfielder),
            forward: weights_for(Position::Forward),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ruleset::ScoringCategory;

    #[test]
    fn test_bare_array_and_wrapped_object_both_parse() {
        let bare: RosterResponse =
            serde_json::from_str(r#"[{"id": 1, "name": "A. Smith", "team": "ABC"}]"#).unwrap();
        assert_eq!(bare.into_players().len(), 1);

        let wrapped: RosterResponse = serde_json::from_str(
            r#"{"players": [{"id": "p1", "name": "A. Smith", "team": "ABC"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_players().len(), 1);
    }

    #[test]
    fn test_alternate_field_names_normalize_once() {
        let raw: RawLeaguePlayer = serde_json::from_str(
            r#"{
                "player_id": 42,
                "full_name": "Andrew Smith",
                "eligible_positions": ["D", "M"],
                "pro_team": "ABC",
                "manager_id": "mgr-7",
                "external_id": 90210
            }"#,
        )
        .unwrap();

        let player = raw.into_roster_player();
        assert_eq!(player.id, "42");
        assert_eq!(player.name, "Andrew Smith");
        assert_eq!(player.position_codes, vec!["D", "M"]);
        assert_eq!(player.team, "ABC");
        assert_eq!(player.owner.as_deref(), Some("mgr-7"));
        assert_eq!(player.opta_id.as_deref(), Some("90210"));
    }

    #[test]
    fn test_unowned_sentinels_map_to_absence() {
        for sentinel in ["\"FA\"", "\"0\"", "\"\"", "0"] {
            let json = format!(r#"{{"id": 1, "name": "X", "owner": {}}}"#, sentinel);
            let raw: RawLeaguePlayer = serde_json::from_str(&json).unwrap();
            assert!(raw.into_roster_player().owner.is_none(), "{}", sentinel);
        }

        let owned: RawLeaguePlayer =
            serde_json::from_str(r#"{"id": 1, "name": "X", "owner": "mgr-1"}"#).unwrap();
        assert_eq!(owned.into_roster_player().owner.as_deref(), Some("mgr-1"));
    }

    #[test]
    fn test_weight_table_normalization() {
        let raw: RawWeightTable = serde_json::from_str(
            r#"{
                "goals": {"GK": 6, "DEF": 6, "MID": 5, "FWD": 4.4},
                "assists": {"GK": 3, "DEF": 3, "MID": 3, "FWD": 3},
                "cleanSheets": {"GK": 4, "DEF": 4, "MID": 1},
                "cards": {"GK": -1, "DEF": -1, "MID": -1, "FWD": -1}
            }"#,
        )
        .unwrap();

        let ruleset = raw.into_ruleset("classic");
        assert_eq!(ruleset.name, "classic");
        assert_eq!(
            ruleset.value(Position::Forward, ScoringCategory::Goals),
            Some(4.4)
        );
        assert_eq!(
            ruleset.value(Position::Forward, ScoringCategory::CleanSheets),
            None
        );
        assert_eq!(
            ruleset.value(Position::Goalkeeper, ScoringCategory::Cards),
            Some(-1.0)
        );
    }

    #[test]
    fn test_adapter_construction() {
        let settings = SourceSettings::default();
        let source = LeagueApiSource::new(&settings).unwrap();
        assert_eq!(source.name(), "league");
    }
}
