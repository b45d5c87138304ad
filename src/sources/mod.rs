//! Upstream source adapters
//!
//! Adapters fetch raw roster/ownership data from the league platform and raw
//! prediction data from the prediction provider, normalizing transport-level
//! shape (wrapped objects vs. bare arrays, alternate field names) into the
//! canonical types once, immediately after fetch. Downstream code never sees
//! provider field names.

pub mod league;
pub mod predictions;
pub mod provider;

pub use league::LeagueApiSource;
pub use predictions::PredictionApiSource;
pub use provider::{
    MockPredictionSource, MockRosterSource, MockRulesetSource, PredictionSource, RosterSource,
    RulesetSource,
};

use serde::Deserialize;

/// Identifier field that arrives as either a JSON number or a string,
/// depending on the provider endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    pub(crate) fn into_string(self) -> String {
        match self {
            IdValue::Number(n) => n.to_string(),
            IdValue::Text(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_value_accepts_both_shapes() {
        let numeric: IdValue = serde_json::from_str("42").unwrap();
        assert_eq!(numeric.into_string(), "42");

        let text: IdValue = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(text.into_string(), "abc-1");
    }
}
