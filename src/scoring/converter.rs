//! Score conversion between rulesets
//!
//! Builds per-position conversion ratios from two rulesets' weight tables and
//! applies them to per-gameweek prediction records. Settled results override
//! forward-looking forecasts for the same gameweek; values accumulate in full
//! precision and are rounded once at the output boundary.

use crate::config::scoring::ScoringSettings;
use crate::scoring::ruleset::{provider_basis, RulesetWeights, ScoringCategory};
use crate::types::{
    CategoryRatios, ConversionRatio, ConvertedGameweek, ConvertedScores, GameweekStatus,
    Position, PredictedPlayer,
};
use crate::utils::round2;
use std::collections::BTreeMap;
use tracing::debug;

/// Fixed position correction applied after the category-weighted base ratio.
///
/// Attacking output is structurally more sensitive to rule differences.
fn position_correction(position: Position) -> f64 {
    match position {
        Position::Goalkeeper => 0.8,
        Position::Defender => 0.9,
        Position::Midfielder => 1.0,
        Position::Forward => 1.1,
    }
}

/// Converts predictions from the provider's scoring basis into a target ruleset
#[derive(Debug, Clone)]
pub struct ScoreConverter {
    settings: ScoringSettings,
    source: RulesetWeights,
}

impl ScoreConverter {
    /// Create a converter against the provider's fixed scoring basis
    pub fn new(settings: ScoringSettings) -> Self {
        Self {
            settings,
            source: provider_basis(),
        }
    }

    /// Create a converter with an explicit source ruleset (tests)
    pub fn with_source(settings: ScoringSettings, source: RulesetWeights) -> Self {
        Self { settings, source }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    /// Build one conversion ratio per position from the target ruleset's
    /// weight table.
    ///
    /// For each position: weighted sums of absolute values over the categories
    /// present in both rulesets, target over source; a category absent on
    /// either side contributes nothing to the sums and reports a neutral
    /// sub-ratio. The position correction is applied next, then the result is
    /// clamped to the configured bounds.
    pub fn build_ratios(&self, target: &RulesetWeights) -> BTreeMap<Position, ConversionRatio> {
        let mut ratios = BTreeMap::new();

        for position in Position::ALL {
            let mut target_sum = 0.0;
            let mut source_sum = 0.0;
            let mut sub_ratios = [1.0f64; 4];

            for (idx, category) in ScoringCategory::ALL.iter().enumerate() {
                let target_value = target.value(position, *category);
                let source_value = self.source.value(position, *category);

                if let (Some(t), Some(s)) = (target_value, source_value) {
                    let weight = category.weight();
                    target_sum += weight * t.abs();
                    source_sum += weight * s.abs();
                    if s.abs() > f64::EPSILON {
                        sub_ratios[idx] = t.abs() / s.abs();
                    }
                }
            }

            let base = if source_sum > f64::EPSILON {
                target_sum / source_sum
            } else {
                1.0
            };

            let correction = position_correction(position);
            let corrected = base * correction;
            let ratio = corrected.clamp(self.settings.ratio_floor, self.settings.ratio_ceiling);
            let clamped = (ratio - corrected).abs() > f64::EPSILON;

            if clamped {
                debug!(
                    "Conversion ratio for {} clamped: {:.4} -> {:.4}",
                    position, corrected, ratio
                );
            }

            ratios.insert(
                position,
                ConversionRatio {
                    position,
                    ratio,
                    categories: CategoryRatios {
                        goals: sub_ratios[0],
                        assists: sub_ratios[1],
                        clean_sheets: sub_ratios[2],
                        cards: sub_ratios[3],
                    },
                    correction,
                    clamped,
                },
            );
        }

        ratios
    }

    /// Convert one player's prediction records with the given ratio.
    ///
    /// A settled result overrides a forecast for the same gameweek; the season
    /// total sums the surviving records; the season average divides by the
    /// configured season length. The current-gameweek value looks up the exact
    /// gameweek, falling back to the nearest later record.
    pub fn convert(
        &self,
        predicted: &PredictedPlayer,
        ratio: &ConversionRatio,
        current_gameweek: u32,
    ) -> ConvertedScores {
        // Resolve overrides: settled results are ground truth once available
        let mut by_gameweek: BTreeMap<u32, &crate::types::GameweekPrediction> = BTreeMap::new();
        for record in &predicted.gameweeks {
            let keep_existing = by_gameweek.get(&record.gameweek).is_some_and(|existing| {
                existing.status == GameweekStatus::Settled
                    && record.status == GameweekStatus::Forecast
            });
            if !keep_existing {
                by_gameweek.insert(record.gameweek, record);
            }
        }

        let mut season_total = 0.0;
        let mut per_gameweek = Vec::with_capacity(by_gameweek.len());
        for (gameweek, record) in &by_gameweek {
            let converted = record.points * ratio.ratio;
            season_total += converted;
            per_gameweek.push(ConvertedGameweek {
                gameweek: *gameweek,
                points: round2(converted),
                settled: record.status == GameweekStatus::Settled,
            });
        }

        let current = by_gameweek
            .get(&current_gameweek)
            .or_else(|| {
                by_gameweek
                    .range(current_gameweek..)
                    .next()
                    .map(|(_, record)| record)
            })
            .map(|record| record.points * ratio.ratio)
            .unwrap_or(0.0);

        let season_average = season_total / f64::from(self.settings.season_length);

        ConvertedScores {
            current_gameweek: round2(current),
            season_total: round2(season_total),
            season_average: round2(season_average),
            per_gameweek,
            ratio_applied: ratio.ratio,
            source_season_points: round2(predicted.season_points),
        }
    }
}

impl Default for ScoreConverter {
    fn default() -> Self {
        Self::new(ScoringSettings::default())
    }
}
