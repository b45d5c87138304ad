//! Canonical position resolution
//!
//! Derives one canonical position from the priority-ordered signals carried by
//! a roster player and, as a last resort, the prediction provider's numeric
//! classification. Roster-side signals win because the league platform is the
//! system of record for where a manager plays the player.

use crate::types::{Position, PredictedPlayer, RosterPlayer};
use tracing::warn;

/// Result of resolving one player's position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPosition {
    pub position: Position,
    /// True when no signal was present and the default was assumed
    pub defaulted: bool,
}

/// Resolves a canonical position from conflicting cross-source signals.
///
/// Never fails; a player with no usable signal resolves to MID and is flagged
/// as degraded for observability.
#[derive(Debug, Clone, Default)]
pub struct PositionResolver;

impl PositionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the canonical position for a roster player, consulting the
    /// matched prediction-side classification only when the roster carries no
    /// signal at all.
    pub fn resolve(
        &self,
        roster: &RosterPlayer,
        predicted: Option<&PredictedPlayer>,
    ) -> ResolvedPosition {
        // 1. Ordered roster position codes, first element wins
        if let Some(code) = roster.position_codes.first() {
            if let Some(position) = map_position_code(code) {
                return ResolvedPosition {
                    position,
                    defaulted: false,
                };
            }
        }

        // 2. Single roster position string
        if let Some(raw) = roster.position.as_deref() {
            if let Some(position) = map_position_code(raw) {
                return ResolvedPosition {
                    position,
                    defaulted: false,
                };
            }
        }

        // 3. Provider numeric classification
        if let Some(class) = predicted.and_then(|p| p.position_class) {
            if let Some(position) = map_position_class(class) {
                return ResolvedPosition {
                    position,
                    defaulted: false,
                };
            }
        }

        warn!(
            "No position signal for player '{}' ({}), defaulting to MID",
            roster.name, roster.id
        );
        ResolvedPosition {
            position: Position::Midfielder,
            defaulted: true,
        }
    }
}

/// Map a roster-side position code or word to a canonical position.
///
/// Short codes match exactly; full words are accepted by substring match so
/// that variants like "Goalkeeper" or "Central Defender" still resolve.
pub fn map_position_code(raw: &str) -> Option<Position> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }

    match code.as_str() {
        "G" | "GK" | "GKP" => return Some(Position::Goalkeeper),
        "D" | "DEF" => return Some(Position::Defender),
        "M" | "MID" => return Some(Position::Midfielder),
        "F" | "FW" | "FWD" | "ST" => return Some(Position::Forward),
        _ => {}
    }

    if code.contains("KEEPER") || code.contains("GOAL") {
        Some(Position::Goalkeeper)
    } else if code.contains("DEFEN") || code.contains("BACK") {
        Some(Position::Defender)
    } else if code.contains("MID") {
        Some(Position::Midfielder)
    } else if code.contains("FORWARD") || code.contains("STRIKER") || code.contains("ATTACK") {
        Some(Position::Forward)
    } else {
        None
    }
}

/// Map the prediction provider's numeric classification to a canonical position
pub fn map_position_class(class: u8) -> Option<Position> {
    match class {
        1 => Some(Position::Goalkeeper),
        2 => Some(Position::Defender),
        3 => Some(Position::Midfielder),
        4 => Some(Position::Forward),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with(codes: Vec<&str>, single: Option<&str>) -> RosterPlayer {
        RosterPlayer {
            id: "p1".to_string(),
            name: "Test Player".to_string(),
            position_codes: codes.into_iter().map(String::from).collect(),
            position: single.map(String::from),
            team: "ABC".to_string(),
            owner: None,
            opta_id: None,
        }
    }

    fn predicted_with_class(class: u8) -> PredictedPlayer {
        PredictedPlayer {
            id: "x1".to_string(),
            name: "Test Player".to_string(),
            position_class: Some(class),
            team: "ABC".to_string(),
            opta_id: None,
            gameweeks: vec![],
            season_points: 0.0,
        }
    }

    #[test]
    fn test_ordered_codes_win_first() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec!["D", "M"], Some("FWD"));
        let resolved = resolver.resolve(&roster, None);
        assert_eq!(resolved.position, Position::Defender);
        assert!(!resolved.defaulted);
    }

    #[test]
    fn test_single_string_used_when_codes_absent() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec![], Some("Goalkeeper"));
        let resolved = resolver.resolve(&roster, None);
        assert_eq!(resolved.position, Position::Goalkeeper);
    }

    #[test]
    fn test_provider_class_is_last_resort() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec![], None);
        let predicted = predicted_with_class(4);
        let resolved = resolver.resolve(&roster, Some(&predicted));
        assert_eq!(resolved.position, Position::Forward);
        assert!(!resolved.defaulted);
    }

    #[test]
    fn test_roster_signal_beats_provider_class() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec!["M"], None);
        let predicted = predicted_with_class(2);
        let resolved = resolver.resolve(&roster, Some(&predicted));
        assert_eq!(resolved.position, Position::Midfielder);
    }

    #[test]
    fn test_no_signal_defaults_to_mid_and_flags() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec![], None);
        let resolved = resolver.resolve(&roster, None);
        assert_eq!(resolved.position, Position::Midfielder);
        assert!(resolved.defaulted);
    }

    #[test]
    fn test_alias_table() {
        assert_eq!(map_position_code("G"), Some(Position::Goalkeeper));
        assert_eq!(map_position_code("gkp"), Some(Position::Goalkeeper));
        assert_eq!(map_position_code("Defender"), Some(Position::Defender));
        assert_eq!(map_position_code("left back"), Some(Position::Defender));
        assert_eq!(map_position_code("MID"), Some(Position::Midfielder));
        assert_eq!(map_position_code("Striker"), Some(Position::Forward));
        assert_eq!(map_position_code("ST"), Some(Position::Forward));
        assert_eq!(map_position_code(""), None);
        assert_eq!(map_position_code("??"), None);
    }

    #[test]
    fn test_numeric_class_table() {
        assert_eq!(map_position_class(1), Some(Position::Goalkeeper));
        assert_eq!(map_position_class(2), Some(Position::Defender));
        assert_eq!(map_position_class(3), Some(Position::Midfielder));
        assert_eq!(map_position_class(4), Some(Position::Forward));
        assert_eq!(map_position_class(0), None);
        assert_eq!(map_position_class(9), None);
    }

    #[test]
    fn test_unmappable_first_code_falls_through() {
        let resolver = PositionResolver::new();
        let roster = roster_with(vec!["??"], Some("M"));
        let resolved = resolver.resolve(&roster, None);
        assert_eq!(resolved.position, Position::Midfielder);
        assert!(!resolved.defaulted);
    }
}
