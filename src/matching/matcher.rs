//! Identity matching algorithms
//!
//! Matching is strictly ordered and stops at the first success: exact
//! cross-reference equality first, then (when enabled) a name+team heuristic.
//! High confidence is reserved exclusively for the cross-reference path, and
//! heuristic ambiguity is treated as no-match, never resolved by picking an
//! arbitrary winner.

use crate::types::{MatchConfidence, MatchMethod, PlayerMatch, PredictedPlayer, RosterPlayer};
use crate::utils::{names_overlap, normalize_name};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Configuration for matching behavior
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Whether the name+team heuristic fallback is allowed; some operating
    /// modes disable it and treat absence of a cross-reference match as
    /// no-match
    pub allow_heuristics: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            allow_heuristics: true,
        }
    }
}

/// Prediction-side candidates indexed for matching
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    players: Vec<PredictedPlayer>,
    by_opta: HashMap<String, usize>,
    by_provider_id: HashMap<String, usize>,
}

impl CandidateIndex {
    /// Build the index; the first candidate carrying a given cross-reference
    /// identifier wins, later duplicates are logged and ignored.
    pub fn build(players: Vec<PredictedPlayer>) -> Self {
        let mut by_opta = HashMap::with_capacity(players.len());
        let mut by_provider_id = HashMap::with_capacity(players.len());

        for (idx, player) in players.iter().enumerate() {
            if let Some(opta_id) = player.opta_id.as_deref().filter(|id| !id.is_empty()) {
                match by_opta.entry(opta_id.to_string()) {
                    std::collections::hash_map::Entry::Occupied(_) => {
                        warn!(
                            "Duplicate cross-reference id '{}' among prediction candidates, keeping first",
                            opta_id
                        );
                    }
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(idx);
                    }
                }
            }
            by_provider_id.insert(player.id.clone(), idx);
        }

        Self {
            players,
            by_opta,
            by_provider_id,
        }
    }

    /// Look up a candidate by cross-reference identifier
    pub fn by_opta(&self, opta_id: &str) -> Option<&PredictedPlayer> {
        self.by_opta.get(opta_id).map(|&idx| &self.players[idx])
    }

    /// Look up a candidate by its provider identifier
    pub fn by_provider_id(&self, id: &str) -> Option<&PredictedPlayer> {
        self.by_provider_id.get(id).map(|&idx| &self.players[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictedPlayer> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Trait for identity matching algorithms
pub trait PlayerMatcher: Send + Sync {
    /// Find the single best correspondence for one roster player, or none.
    ///
    /// Must be a pure function of its inputs: repeated calls with the same
    /// arguments yield the same result.
    fn match_player(
        &self,
        roster: &RosterPlayer,
        candidates: &CandidateIndex,
        config: &MatchingConfig,
    ) -> PlayerMatch;
}

/// Cross-reference-first matcher with a strict name+team heuristic fallback
#[derive(Debug, Clone, Default)]
pub struct TieredPlayerMatcher;

impl TieredPlayerMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Step 2: case-folded substring containment in either direction AND
    /// exact team equality. Exactly one satisfying candidate is a Medium
    /// match; zero or several is a no-match.
    fn heuristic_match<'a>(
        &self,
        roster: &RosterPlayer,
        candidates: &'a CandidateIndex,
    ) -> Option<&'a PredictedPlayer> {
        let roster_name = normalize_name(&roster.name);
        if roster_name.is_empty() {
            return None;
        }

        let satisfying: Vec<&PredictedPlayer> = candidates
            .iter()
            .filter(|candidate| {
                candidate.team.eq_ignore_ascii_case(&roster.team)
                    && names_overlap(&roster_name, &normalize_name(&candidate.name))
            })
            .collect();

        match satisfying.as_slice() {
            [single] => Some(*single),
            [] => None,
            multiple => {
                let ambiguity = crate::error::PipelineError::MatchAmbiguous {
                    player: roster.name.clone(),
                    candidates: multiple.len(),
                };
                debug!("Heuristic matching gave up: {}", ambiguity);
                None
            }
        }
    }
}

impl PlayerMatcher for TieredPlayerMatcher {
    fn match_player(
        &self,
        roster: &RosterPlayer,
        candidates: &CandidateIndex,
        config: &MatchingConfig,
    ) -> PlayerMatch {
        // 1. Cross-reference exact match: the only path to High confidence
        if let Some(opta_id) = roster.opta_id.as_deref().filter(|id| !id.is_empty()) {
            if let Some(candidate) = candidates.by_opta(opta_id) {
                return PlayerMatch {
                    roster: roster.clone(),
                    predicted: Some(candidate.clone()),
                    confidence: MatchConfidence::High,
                    method: Some(MatchMethod::CrossReference),
                };
            }
        }

        // 2. Heuristic fallback, only when configured on
        if config.allow_heuristics {
            if let Some(candidate) = self.heuristic_match(roster, candidates) {
                return PlayerMatch {
                    roster: roster.clone(),
                    predicted: Some(candidate.clone()),
                    confidence: MatchConfidence::Medium,
                    method: Some(MatchMethod::NameTeam),
                };
            }
        }

        // 3. No-match: the roster player is still kept downstream
        PlayerMatch::unmatched(roster.clone())
    }
}

/// Detect duplicate cross-reference identifiers among roster-side players.
///
/// The first occurrence keeps its identifier; later occurrences have it
/// cleared so they cannot claim the same prediction, and the flagged ids are
/// returned for the run report.
pub fn dedupe_roster_cross_refs(players: &mut [RosterPlayer]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut flagged = Vec::new();

    for (idx, player) in players.iter_mut().enumerate() {
        let Some(opta_id) = player.opta_id.clone().filter(|id| !id.is_empty()) else {
            continue;
        };

        match seen.get(&opta_id) {
            Some(first_idx) => {
                warn!(
                    "Duplicate cross-reference id '{}' on roster players #{} and #{}, first wins",
                    opta_id, first_idx, idx
                );
                player.opta_id = None;
                if !flagged.contains(&opta_id) {
                    flagged.push(opta_id);
                }
            }
            None => {
                seen.insert(opta_id, idx);
            }
        }
    }

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(name: &str, team: &str, opta_id: Option<&str>) -> RosterPlayer {
        RosterPlayer {
            id: format!("r-{}", name),
            name: name.to_string(),
            position_codes: vec!["M".to_string()],
            position: None,
            team: team.to_string(),
            owner: None,
            opta_id: opta_id.map(String::from),
        }
    }

    fn candidate(name: &str, team: &str, opta_id: Option<&str>) -> PredictedPlayer {
        PredictedPlayer {
            id: format!("c-{}", name),
            name: name.to_string(),
            position_class: Some(3),
            team: team.to_string(),
            opta_id: opta_id.map(String::from),
            gameweeks: vec![],
            season_points: 100.0,
        }
    }

    #[test]
    fn test_cross_reference_match_is_high_confidence() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        // Names disagree entirely; the cross-reference id decides
        let roster = roster("A. Smith", "ABC", Some("X1"));
        let index = CandidateIndex::build(vec![candidate("Andrew Smith", "ABC", Some("X1"))]);

        let result = matcher.match_player(&roster, &index, &config);
        assert_eq!(result.confidence, MatchConfidence::High);
        assert_eq!(result.method, Some(MatchMethod::CrossReference));
        assert_eq!(result.predicted.unwrap().opta_id.as_deref(), Some("X1"));
    }

    #[test]
    fn test_heuristic_match_is_medium_confidence() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        let roster = roster("J. Doe", "XYZ", None);
        let index = CandidateIndex::build(vec![candidate("John Doe", "XYZ", None)]);

        let result = matcher.match_player(&roster, &index, &config);
        assert_eq!(result.confidence, MatchConfidence::Medium);
        assert_eq!(result.method, Some(MatchMethod::NameTeam));
    }

    #[test]
    fn test_high_confidence_never_from_heuristics() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        // Identical name and team but no cross-reference on either side
        let roster = roster("John Doe", "XYZ", None);
        let index = CandidateIndex::build(vec![candidate("John Doe", "XYZ", None)]);

        let result = matcher.match_player(&roster, &index, &config);
        assert!(result.confidence < MatchConfidence::High);
    }

    #[test]
    fn test_ambiguous_heuristic_is_no_match() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        let roster = roster("Smith", "XYZ", None);
        let index = CandidateIndex::build(vec![
            candidate("John Smith", "XYZ", None),
            candidate("Alan Smith", "XYZ", None),
        ]);

        let result = matcher.match_player(&roster, &index, &config);
        assert!(result.predicted.is_none());
        assert_eq!(result.confidence, MatchConfidence::Low);
        assert!(result.method.is_none());
    }

    #[test]
    fn test_team_mismatch_blocks_heuristic() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        let roster = roster("J. Doe", "XYZ", None);
        let index = CandidateIndex::build(vec![candidate("John Doe", "ABC", None)]);

        let result = matcher.match_player(&roster, &index, &config);
        assert!(result.predicted.is_none());
    }

    #[test]
    fn test_heuristics_disabled_yields_no_match() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig {
            allow_heuristics: false,
        };

        let roster = roster("J. Doe", "XYZ", None);
        let index = CandidateIndex::build(vec![candidate("John Doe", "XYZ", None)]);

        let result = matcher.match_player(&roster, &index, &config);
        assert!(result.predicted.is_none());
    }

    #[test]
    fn test_cross_reference_beats_heuristic_candidates() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        let roster = roster("J. Doe", "XYZ", Some("X9"));
        let index = CandidateIndex::build(vec![
            candidate("John Doe", "XYZ", None),
            candidate("Completely Different", "ABC", Some("X9")),
        ]);

        let result = matcher.match_player(&roster, &index, &config);
        assert_eq!(result.confidence, MatchConfidence::High);
        assert_eq!(
            result.predicted.unwrap().name,
            "Completely Different".to_string()
        );
    }

    #[test]
    fn test_matching_is_deterministic() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig::default();

        let roster = roster("J. Doe", "XYZ", None);
        let index = CandidateIndex::build(vec![
            candidate("John Doe", "XYZ", None),
            candidate("Jane Roe", "XYZ", None),
        ]);

        let first = matcher.match_player(&roster, &index, &config);
        for _ in 0..10 {
            let again = matcher.match_player(&roster, &index, &config);
            assert_eq!(first.confidence, again.confidence);
            assert_eq!(first.method, again.method);
            assert_eq!(
                first.predicted.as_ref().map(|p| p.id.clone()),
                again.predicted.as_ref().map(|p| p.id.clone())
            );
        }
    }

    #[test]
    fn test_empty_cross_reference_is_ignored() {
        let matcher = TieredPlayerMatcher::new();
        let config = MatchingConfig {
            allow_heuristics: false,
        };

        let roster = roster("J. Doe", "XYZ", Some(""));
        let index = CandidateIndex::build(vec![candidate("John Doe", "XYZ", Some(""))]);

        let result = matcher.match_player(&roster, &index, &config);
        assert!(result.predicted.is_none());
    }

    #[test]
    fn test_dedupe_roster_cross_refs_first_wins() {
        let mut players = vec![
            roster("First", "ABC", Some("X1")),
            roster("Second", "DEF", Some("X1")),
            roster("Third", "GHI", Some("X2")),
            roster("Fourth", "JKL", Some("X1")),
        ];

        let flagged = dedupe_roster_cross_refs(&mut players);

        assert_eq!(flagged, vec!["X1".to_string()]);
        assert_eq!(players[0].opta_id.as_deref(), Some("X1"));
        assert!(players[1].opta_id.is_none());
        assert_eq!(players[2].opta_id.as_deref(), Some("X2"));
        assert!(players[3].opta_id.is_none());
    }

    #[test]
    fn test_candidate_index_duplicate_opta_keeps_first() {
        let index = CandidateIndex::build(vec![
            candidate("First", "ABC", Some("X1")),
            candidate("Second", "DEF", Some("X1")),
        ]);

        assert_eq!(index.by_opta("X1").unwrap().name, "First");
        assert_eq!(index.len(), 2);
    }
}
