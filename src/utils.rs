//! Utility functions for the integration pipeline

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique run ID
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Round a points value to two decimal places.
///
/// Applied once at the output boundary; intermediate accumulation keeps full
/// precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Case-fold a display name for comparison: lowercase, abbreviation dots
/// removed, whitespace collapsed
pub fn normalize_name(name: &str) -> String {
    name.replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether two normalized display names plausibly refer to the same player:
/// substring containment in either direction, or an abbreviated first name
/// ("j doe") agreeing with the full form ("john doe") on surname and initial.
pub fn names_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    surname_and_initial_agree(a, b)
}

fn surname_and_initial_agree(a: &str, b: &str) -> bool {
    let a_tokens: Vec<&str> = a.split_whitespace().collect();
    let b_tokens: Vec<&str> = b.split_whitespace().collect();

    let (Some(a_last), Some(b_last)) = (a_tokens.last(), b_tokens.last()) else {
        return false;
    };
    if a_last != b_last {
        return false;
    }

    // When both sides carry a first name, abbreviated or not, the initials
    // must agree; a surname-only name is compatible with any first name
    match (a_tokens.first(), b_tokens.first()) {
        (Some(a_first), Some(b_first)) if a_tokens.len() > 1 && b_tokens.len() > 1 => {
            a_first.chars().next() == b_first.chars().next()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_run_ids() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(4.567), 4.57);
        assert_eq!(round2(-1.004), -1.0);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  John   Doe "), "john doe");
        assert_eq!(normalize_name("SMITH"), "smith");
        assert_eq!(normalize_name("J. Doe"), "j doe");
    }

    #[test]
    fn test_names_overlap_containment() {
        assert!(names_overlap("john doe", "doe"));
        assert!(names_overlap("doe", "john doe"));
        assert!(!names_overlap("john doe", "jane roe"));
        assert!(!names_overlap("", "doe"));
    }

    #[test]
    fn test_names_overlap_abbreviated_first_name() {
        assert!(names_overlap("j doe", "john doe"));
        assert!(names_overlap("john doe", "j doe"));
        // Same surname but conflicting initials is not a plausible overlap
        assert!(!names_overlap("a doe", "john doe"));
        assert!(!names_overlap("j doe", "j roe"));
    }
}
