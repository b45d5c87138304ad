//! Ruleset-driven score conversion
//!
//! This module translates point predictions computed under the prediction
//! provider's scoring basis into a target ruleset's equivalent, via
//! position-specific conversion ratios.

pub mod converter;
pub mod ruleset;

pub use converter::ScoreConverter;
pub use ruleset::{CategoryWeights, RulesetWeights, ScoringCategory};
