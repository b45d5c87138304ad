//! Error types for the integration pipeline
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific pipeline scenarios
///
/// `SourceUnavailable`, `EmptyData` and `NoUsablePredictions` are fatal to a
/// run and surface to the caller with no partial player collection. The
/// remaining variants are recoverable and are downgraded per-player or
/// per-component.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Source unavailable: {source_name}: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Source returned no records: {source_name}")]
    EmptyData { source_name: String },

    #[error("Ambiguous match for player '{player}': {candidates} equally valid candidates")]
    MatchAmbiguous { player: String, candidates: usize },

    #[error("Conversion degraded: {message}")]
    ConversionDegraded { message: String },

    #[error("No usable predictions: no player carries positive predicted points")]
    NoUsablePredictions,

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl PipelineError {
    /// Short machine-readable kind tag, used in the structured error response
    /// and in metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable { .. } => "source_unavailable",
            PipelineError::EmptyData { .. } => "empty_data",
            PipelineError::MatchAmbiguous { .. } => "match_ambiguous",
            PipelineError::ConversionDegraded { .. } => "conversion_degraded",
            PipelineError::NoUsablePredictions => "no_usable_predictions",
            PipelineError::ConfigurationError { .. } => "configuration",
            PipelineError::InternalError { .. } => "internal",
        }
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. }
                | PipelineError::EmptyData { .. }
                | PipelineError::NoUsablePredictions
                | PipelineError::ConfigurationError { .. }
                | PipelineError::InternalError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PipelineError::SourceUnavailable {
            source_name: "league".to_string(),
            message: "timeout".to_string(),
        }
        .is_fatal());
        assert!(PipelineError::EmptyData {
            source_name: "predictions".to_string(),
        }
        .is_fatal());
        assert!(PipelineError::NoUsablePredictions.is_fatal());

        assert!(!PipelineError::MatchAmbiguous {
            player: "J. Doe".to_string(),
            candidates: 2,
        }
        .is_fatal());
        assert!(!PipelineError::ConversionDegraded {
            message: "weights unavailable".to_string(),
        }
        .is_fatal());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            PipelineError::NoUsablePredictions.kind(),
            "no_usable_predictions"
        );
        assert_eq!(
            PipelineError::EmptyData {
                source_name: "league".to_string()
            }
            .kind(),
            "empty_data"
        );
    }
}
