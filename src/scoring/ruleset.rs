//! Scoring ruleset weight tables
//!
//! A ruleset is a named set of per-category point weights keyed by position.
//! The prediction provider's implicit basis is fixed here; the target ruleset
//! is fetched live from the league platform, with a hardcoded default as the
//! degraded-but-functional fallback.

use crate::types::Position;
use serde::{Deserialize, Serialize};

/// The four comparable scoring categories used for ratio construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringCategory {
    Goals,
    Assists,
    CleanSheets,
    Cards,
}

impl ScoringCategory {
    /// All categories, in weight order
    pub const ALL: [ScoringCategory; 4] = [
        ScoringCategory::Goals,
        ScoringCategory::Assists,
        ScoringCategory::CleanSheets,
        ScoringCategory::Cards,
    ];

    /// Fixed relative importance of this category in ratio construction
    pub fn weight(&self) -> f64 {
        match self {
            ScoringCategory::Goals => 0.4,
            ScoringCategory::Assists => 0.3,
            ScoringCategory::CleanSheets => 0.2,
            ScoringCategory::Cards => 0.1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoringCategory::Goals => "goals",
            ScoringCategory::Assists => "assists",
            ScoringCategory::CleanSheets => "clean_sheets",
            ScoringCategory::Cards => "cards",
        }
    }
}

/// Point weights for one position; an absent category carries no weight in
/// that ruleset (e.g. forwards earn nothing for clean sheets)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub goals: Option<f64>,
    pub assists: Option<f64>,
    pub clean_sheets: Option<f64>,
    pub cards: Option<f64>,
}

impl CategoryWeights {
    pub fn value(&self, category: ScoringCategory) -> Option<f64> {
        match category {
            ScoringCategory::Goals => self.goals,
            ScoringCategory::Assists => self.assists,
            ScoringCategory::CleanSheets => self.clean_sheets,
            ScoringCategory::Cards => self.cards,
        }
    }
}

/// A named ruleset: per-position category weight tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesetWeights {
    pub name: String,
    pub goalkeeper: CategoryWeights,
    pub defender: CategoryWeights,
    pub midfielder: CategoryWeights,
    pub forward: CategoryWeights,
}

impl RulesetWeights {
    pub fn for_position(&self, position: Position) -> &CategoryWeights {
        match position {
            Position::Goalkeeper => &self.goalkeeper,
            Position::Defender => &self.defender,
            Position::Midfielder => &self.midfielder,
            Position::Forward => &self.forward,
        }
    }

    pub fn value(&self, position: Position, category: ScoringCategory) -> Option<f64> {
        self.for_position(position).value(category)
    }
}

/// The prediction provider's implicit scoring basis (FPL-style weights).
///
/// Every fetched prediction is expressed under this table; conversion ratios
/// are computed against it.
pub fn provider_basis() -> RulesetWeights {
    RulesetWeights {
        name: "provider-basis".to_string(),
        goalkeeper: CategoryWeights {
            goals: Some(6.0),
            assists: Some(3.0),
            clean_sheets: Some(4.0),
            cards: Some(-1.0),
        },
        defender: CategoryWeights {
            goals: Some(6.0),
            assists: Some(3.0),
            clean_sheets: Some(4.0),
            cards: Some(-1.0),
        },
        midfielder: CategoryWeights {
            goals: Some(5.0),
            assists: Some(3.0),
            clean_sheets: Some(1.0),
            cards: Some(-1.0),
        },
        forward: CategoryWeights {
            goals: Some(4.0),
            assists: Some(3.0),
            clean_sheets: None,
            cards: Some(-1.0),
        },
    }
}

/// Hardcoded target weights used when the league platform's live table cannot
/// be fetched. Degraded-but-functional mode, flagged in run metadata.
pub fn default_target() -> RulesetWeights {
    RulesetWeights {
        name: "default-target".to_string(),
        goalkeeper: CategoryWeights {
            goals: Some(6.0),
            assists: Some(3.5),
            clean_sheets: Some(5.0),
            cards: Some(-1.0),
        },
        defender: CategoryWeights {
            goals: Some(6.0),
            assists: Some(3.5),
            clean_sheets: Some(4.5),
            cards: Some(-1.0),
        },
        midfielder: CategoryWeights {
            goals: Some(5.5),
            assists: Some(3.5),
            clean_sheets: Some(1.0),
            cards: Some(-1.0),
        },
        forward: CategoryWeights {
            goals: Some(4.5),
            assists: Some(3.5),
            clean_sheets: None,
            cards: Some(-1.0),
        },
    }
}
