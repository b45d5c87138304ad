//! Common types used throughout the integration pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a pipeline run
pub type RunId = Uuid;

/// League-manager identifier (owner of a rostered player)
pub type ManagerId = String;

/// Canonical playing position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// Short code used in reports and cache keys
    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// All positions, in display order
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A player as known by the fantasy-league platform.
///
/// Created on each fetch cycle and owned by the orchestrator for the duration
/// of one integration pass; never persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterPlayer {
    /// Stable platform identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Ordered raw position codes, strongest signal first (may be empty)
    pub position_codes: Vec<String>,
    /// Single raw position string, used when `position_codes` is empty
    pub position: Option<String>,
    /// Team abbreviation
    pub team: String,
    /// Current owner; `None` means unowned
    pub owner: Option<ManagerId>,
    /// Cross-reference identifier shared with the prediction provider
    pub opta_id: Option<String>,
}

/// Whether a gameweek record is a forward-looking forecast or a settled result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameweekStatus {
    Forecast,
    Settled,
}

/// One gameweek's prediction record from the prediction provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameweekPrediction {
    pub gameweek: u32,
    pub points: f64,
    pub minutes: f64,
    pub status: GameweekStatus,
}

/// A player as known by the prediction provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedPlayer {
    /// Provider identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider position classification (1=GK, 2=DEF, 3=MID, 4=FWD)
    pub position_class: Option<u8>,
    /// Team code
    pub team: String,
    /// Cross-reference identifier shared with the league platform
    pub opta_id: Option<String>,
    /// Per-gameweek prediction records
    pub gameweeks: Vec<GameweekPrediction>,
    /// Season-aggregate prediction under the provider's own ruleset
    pub season_points: f64,
}

/// Confidence level of an identity match, ordinal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MatchConfidence {
    Low,
    Medium,
    High,
}

/// How a match was produced.
///
/// `CrossReference` is the only method that may carry High confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethod {
    CrossReference,
    NameTeam,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::CrossReference => write!(f, "cross-reference-id"),
            MatchMethod::NameTeam => write!(f, "name+team-heuristic"),
        }
    }
}

/// Output of the identity matcher for one roster player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMatch {
    pub roster: RosterPlayer,
    /// Absent on no-match; the roster player is still kept downstream
    pub predicted: Option<PredictedPlayer>,
    pub confidence: MatchConfidence,
    pub method: Option<MatchMethod>,
}

impl PlayerMatch {
    /// A no-match result that keeps the roster player as an unenriched entry
    pub fn unmatched(roster: RosterPlayer) -> Self {
        Self {
            roster,
            predicted: None,
            confidence: MatchConfidence::Low,
            method: None,
        }
    }
}

/// Per-category sub-ratios behind a conversion ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryRatios {
    pub goals: f64,
    pub assists: f64,
    pub clean_sheets: f64,
    pub cards: f64,
}

/// A position-specific multiplier translating points between rulesets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRatio {
    pub position: Position,
    /// Final multiplier after correction and clamping
    pub ratio: f64,
    /// Per-category sub-ratios that produced the base ratio
    pub categories: CategoryRatios,
    /// Position correction factor applied
    pub correction: f64,
    /// Whether the clamp bound changed the value
    pub clamped: bool,
}

/// One converted gameweek value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedGameweek {
    pub gameweek: u32,
    pub points: f64,
    /// True when the value came from a settled result rather than a forecast
    pub settled: bool,
}

/// Converted scoring figures for one player, rounded at this boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedScores {
    pub current_gameweek: f64,
    pub season_total: f64,
    pub season_average: f64,
    pub per_gameweek: Vec<ConvertedGameweek>,
    /// Multiplier that was applied
    pub ratio_applied: f64,
    /// Season points under the provider's own ruleset, for reference
    pub source_season_points: f64,
}

/// A roster player merged with converted scoring fields.
///
/// Constructed once per pipeline run and immutable afterwards; the next run
/// supersedes the whole set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPlayer {
    pub id: String,
    pub name: String,
    pub team: String,
    pub owner: Option<ManagerId>,
    pub opta_id: Option<String>,
    pub position: Position,
    /// Set when no position signal was present and MID was assumed
    pub position_defaulted: bool,
    /// Absent for unmatched or failed players
    pub scores: Option<ConvertedScores>,
    pub confidence: MatchConfidence,
    pub method: Option<MatchMethod>,
    /// Per-player enhancement failure, captured without aborting the run
    pub enhancement_error: Option<String>,
}

/// Aggregate counts for a completed run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Percentage of roster players with a matched prediction
    pub match_rate: f64,
}

/// The merged, ordered output of one integration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    /// Target ruleset the scores were converted into
    pub ruleset: String,
    /// Gameweek the `current_gameweek` values refer to
    pub gameweek: u32,
    /// Source-ordered players, enriched where a prediction matched
    pub players: Vec<EnrichedPlayer>,
    pub totals: ReportTotals,
    /// Conversion ratios applied, one per position
    pub ratios: Vec<ConversionRatio>,
    /// True when the target weights fetch failed and defaults were used
    pub weights_degraded: bool,
    /// Roster-side cross-reference ids seen more than once (first wins)
    pub duplicate_opta_ids: Vec<String>,
}

/// Inbound trigger options for one integration run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Bypass cache reads (fresh results are still written to cache)
    pub force_refresh: bool,
    /// Target ruleset selector; the configured default applies when absent
    pub ruleset: Option<String>,
    /// Explicit current gameweek; derived from the prediction set when absent
    pub gameweek: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_codes() {
        assert_eq!(Position::Goalkeeper.code(), "GK");
        assert_eq!(Position::Forward.to_string(), "FWD");
        assert_eq!(Position::ALL.len(), 4);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(MatchConfidence::High > MatchConfidence::Medium);
        assert!(MatchConfidence::Medium > MatchConfidence::Low);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(MatchMethod::CrossReference.to_string(), "cross-reference-id");
        assert_eq!(MatchMethod::NameTeam.to_string(), "name+team-heuristic");
    }

    #[test]
    fn test_unmatched_keeps_roster_player() {
        let roster = RosterPlayer {
            id: "p1".to_string(),
            name: "J. Doe".to_string(),
            position_codes: vec![],
            position: None,
            team: "XYZ".to_string(),
            owner: None,
            opta_id: None,
        };
        let result = PlayerMatch::unmatched(roster);
        assert!(result.predicted.is_none());
        assert_eq!(result.confidence, MatchConfidence::Low);
        assert!(result.method.is_none());
        assert_eq!(result.roster.id, "p1");
    }
}
