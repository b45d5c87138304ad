//! Cross-source player identity matching
//!
//! This module reconciles the league platform's player identities with the
//! prediction provider's. A wrong match silently corrupts scores, so the
//! matcher trades a bounded false-negative rate for a near-zero
//! false-positive rate.

pub mod matcher;

pub use matcher::{
    dedupe_roster_cross_refs, CandidateIndex, MatchingConfig, PlayerMatcher, TieredPlayerMatcher,
};
