//! Scoring conversion configuration

/// Knobs for the score converter
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    /// Number of gameweeks in a season
    pub season_length: u32,
    /// Lower clamp bound for conversion ratios
    pub ratio_floor: f64,
    /// Upper clamp bound for conversion ratios
    pub ratio_ceiling: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            season_length: 38,
            ratio_floor: 0.6,
            ratio_ceiling: 1.5,
        }
    }
}

impl ScoringSettings {
    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.season_length == 0 {
            return Err(crate::error::PipelineError::ConfigurationError {
                message: "season_length must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ratio_floor <= 0.0 || self.ratio_floor >= self.ratio_ceiling {
            return Err(crate::error::PipelineError::ConfigurationError {
                message: "ratio_floor must be positive and below ratio_ceiling".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
