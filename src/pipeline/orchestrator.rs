//! The integration orchestrator
//!
//! One run walks linear stages with no backward transitions:
//! fetch sources -> match all -> convert all -> assemble -> cache. Source
//! failures abort the whole run with no partial result; a single player's
//! enhancement failure is downgraded to an unenriched entry instead.

use crate::cache::{KeyClass, TtlCache};
use crate::error::PipelineError;
use crate::matching::{dedupe_roster_cross_refs, CandidateIndex, MatchingConfig, PlayerMatcher};
use crate::metrics::MetricsCollector;
use crate::position::PositionResolver;
use crate::scoring::ruleset::default_target;
use crate::scoring::ScoreConverter;
use crate::sources::{PredictionSource, RosterSource, RulesetSource};
use crate::types::{
    ConversionRatio, EnrichedPlayer, GameweekStatus, IntegrationReport, MatchConfidence,
    MatchMethod, PlayerMatch, Position, PredictedPlayer, ReportTotals, RosterPlayer, RunOptions,
};
use crate::utils::{current_timestamp, generate_run_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-source fetch timeout; a timeout is treated as a source failure
    pub source_timeout: Duration,
    /// Bound on concurrent per-player enrichment tasks
    pub max_concurrent_enrichments: usize,
    /// Identity matching behavior
    pub matching: MatchingConfig,
    /// Target ruleset applied when the trigger does not name one
    pub default_ruleset: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(5),
            max_concurrent_enrichments: 8,
            matching: MatchingConfig::default(),
            default_ruleset: "classic".to_string(),
        }
    }
}

/// Statistics about pipeline operations
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total runs completed successfully
    pub runs_completed: u64,
    /// Total runs aborted by a fatal error
    pub runs_failed: u64,
    /// Total players enriched across all runs
    pub players_enriched: u64,
    /// Match rate of the most recent successful run, percent
    pub last_match_rate: f64,
    /// Completion time of the most recent successful run
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Cached identity match for one roster player
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMatch {
    predicted_id: String,
    confidence: MatchConfidence,
    method: Option<MatchMethod>,
}

/// Shared inputs for the per-player enrichment fan-out
struct EnrichContext {
    matcher: Arc<dyn PlayerMatcher>,
    candidates: CandidateIndex,
    converter: ScoreConverter,
    resolver: PositionResolver,
    ratios: BTreeMap<Position, ConversionRatio>,
    matching: MatchingConfig,
    cache: Arc<TtlCache>,
    gameweek: u32,
    force_refresh: bool,
}

/// The integration orchestrator.
///
/// All collaborators are injected at construction time; a missing dependency
/// is a construction-time error, never a runtime lookup failure.
pub struct IntegrationPipeline {
    roster_source: Arc<dyn RosterSource>,
    prediction_source: Arc<dyn PredictionSource>,
    ruleset_source: Arc<dyn RulesetSource>,
    matcher: Arc<dyn PlayerMatcher>,
    converter: ScoreConverter,
    resolver: PositionResolver,
    cache: Arc<TtlCache>,
    metrics: Arc<MetricsCollector>,
    config: PipelineConfig,
    stats: Arc<RwLock<PipelineStats>>,
}

impl IntegrationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        roster_source: Arc<dyn RosterSource>,
        prediction_source: Arc<dyn PredictionSource>,
        ruleset_source: Arc<dyn RulesetSource>,
        matcher: Arc<dyn PlayerMatcher>,
        converter: ScoreConverter,
        cache: Arc<TtlCache>,
        metrics: Arc<MetricsCollector>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            roster_source,
            prediction_source,
            ruleset_source,
            matcher,
            converter,
            resolver: PositionResolver::new(),
            cache,
            metrics,
            config,
            stats: Arc::new(RwLock::new(PipelineStats::default())),
        }
    }

    /// Snapshot of pipeline statistics
    pub fn stats(&self) -> PipelineStats {
        self.stats
            .read()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Shared cache handle
    pub fn cache(&self) -> Arc<TtlCache> {
        self.cache.clone()
    }

    /// Execute one integration run.
    ///
    /// Fatal errors surface as a structured `PipelineError` with no partial
    /// player collection; per-player failures are captured on the player
    /// record instead.
    pub async fn run(&self, options: RunOptions) -> Result<IntegrationReport, PipelineError> {
        let started = Instant::now();
        let run_id = generate_run_id();
        let ruleset = options
            .ruleset
            .clone()
            .unwrap_or_else(|| self.config.default_ruleset.clone());

        info!(
            "Starting integration run {} - ruleset: '{}', force_refresh: {}",
            run_id, ruleset, options.force_refresh
        );

        let report_key = format!("report:{}", ruleset);
        if !options.force_refresh {
            if let Some(report) = self.cache.get::<IntegrationReport>(&report_key) {
                info!(
                    "Serving cached report for ruleset '{}' ({} players)",
                    ruleset,
                    report.players.len()
                );
                self.metrics.record_report_served_from_cache();
                return Ok(report);
            }
        }

        let result = self.run_stages(&options, &ruleset, run_id).await;
        let duration = started.elapsed();

        match &result {
            Ok(report) => {
                self.metrics.record_run("success", duration);
                self.metrics.set_match_rate(report.totals.match_rate);
                self.record_success(report);
                info!(
                    "Integration run {} completed - {} players, {} matched ({:.1}%), {:.2}ms",
                    run_id,
                    report.totals.total,
                    report.totals.matched,
                    report.totals.match_rate,
                    duration.as_secs_f64() * 1000.0
                );

                if let Err(e) =
                    self.cache
                        .set_with_ttl(&report_key, report, KeyClass::Rosters.ttl())
                {
                    warn!("Failed to cache integration report: {}", e);
                }
            }
            Err(e) => {
                self.metrics.record_run(e.kind(), duration);
                self.record_failure();
                error!(
                    "Integration run {} failed after {:.2}ms: {}",
                    run_id,
                    duration.as_secs_f64() * 1000.0,
                    e
                );
            }
        }

        result
    }

    /// The linear stage sequence behind `run`
    async fn run_stages(
        &self,
        options: &RunOptions,
        ruleset: &str,
        run_id: uuid::Uuid,
    ) -> Result<IntegrationReport, PipelineError> {
        // Stage 1: fetch both sources concurrently, join semantics
        let (mut rosters, predictions) = self.fetch_sources(options.force_refresh).await?;
        debug!(
            "Fetched {} roster players and {} predicted players",
            rosters.len(),
            predictions.len()
        );

        // Duplicate cross-reference ids: first occurrence wins, rest flagged
        let duplicate_opta_ids = dedupe_roster_cross_refs(&mut rosters);

        // Conversion ratios, cached long-term; weight fetch failure degrades
        let (ratios, weights_degraded) = self
            .conversion_ratios(ruleset, options.force_refresh)
            .await;

        let gameweek = options
            .gameweek
            .unwrap_or_else(|| self.derive_current_gameweek(&predictions));

        // Stages 2+3: match and convert as a bounded fan-out per player
        let players = self
            .enrich_players(rosters, predictions, ratios.clone(), gameweek, options)
            .await?;

        // Data present but meaningless is a hard failure, not a quiet report
        let usable = players
            .iter()
            .any(|p| p.scores.as_ref().is_some_and(|s| s.season_total > 0.0));
        if !usable {
            return Err(PipelineError::NoUsablePredictions);
        }

        // Stage 4: assemble, preserving source order
        let matched = players.iter().filter(|p| p.scores.is_some()).count();
        let total = players.len();
        let match_rate = if total > 0 {
            (matched as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Ok(IntegrationReport {
            run_id,
            generated_at: current_timestamp(),
            ruleset: ruleset.to_string(),
            gameweek,
            players,
            totals: ReportTotals {
                total,
                matched,
                unmatched: total - matched,
                match_rate: crate::utils::round2(match_rate),
            },
            ratios: ratios.into_values().collect(),
            weights_degraded,
            duplicate_opta_ids,
        })
    }

    /// Fetch rosters and predictions concurrently.
    ///
    /// Both must succeed with non-empty collections; the first failure
    /// short-circuits the other. Fresh results are written to cache even on a
    /// force-refresh run.
    async fn fetch_sources(
        &self,
        force_refresh: bool,
    ) -> Result<(Vec<RosterPlayer>, Vec<PredictedPlayer>), PipelineError> {
        let roster_key = format!("rosters:{}", self.roster_source.name());
        let prediction_key = format!("predictions:{}", self.prediction_source.name());

        let cached_rosters = if force_refresh {
            None
        } else {
            self.cache.get::<Vec<RosterPlayer>>(&roster_key)
        };
        let cached_predictions = if force_refresh {
            None
        } else {
            self.cache.get::<Vec<PredictedPlayer>>(&prediction_key)
        };

        let rosters_fut = async {
            if let Some(players) = cached_rosters {
                debug!("Roster fetch served from cache ({} players)", players.len());
                return Ok(players);
            }

            let source_name = self.roster_source.name().to_string();
            let fetch_started = Instant::now();
            let fetched = timeout(self.config.source_timeout, self.roster_source.fetch_rosters())
                .await
                .map_err(|_| PipelineError::SourceUnavailable {
                    source_name: source_name.clone(),
                    message: format!("timed out after {:?}", self.config.source_timeout),
                })?
                .map_err(|e| PipelineError::SourceUnavailable {
                    source_name: source_name.clone(),
                    message: e.to_string(),
                });

            let duration = fetch_started.elapsed();
            let fetched = match fetched {
                Ok(players) => {
                    self.metrics
                        .record_source_fetch(&source_name, true, duration, players.len());
                    players
                }
                Err(e) => {
                    self.metrics
                        .record_source_fetch(&source_name, false, duration, 0);
                    return Err(e);
                }
            };

            if fetched.is_empty() {
                return Err(PipelineError::EmptyData {
                    source_name: source_name.clone(),
                });
            }

            if let Err(e) = self.cache.set(&roster_key, &fetched) {
                warn!("Failed to cache roster fetch: {}", e);
            }
            Ok(fetched)
        };

        let predictions_fut = async {
            if let Some(players) = cached_predictions {
                debug!(
                    "Prediction fetch served from cache ({} players)",
                    players.len()
                );
                return Ok(players);
            }

            let source_name = self.prediction_source.name().to_string();
            let fetch_started = Instant::now();
            let fetched = timeout(
                self.config.source_timeout,
                self.prediction_source.fetch_predictions(),
            )
            .await
            .map_err(|_| PipelineError::SourceUnavailable {
                source_name: source_name.clone(),
                message: format!("timed out after {:?}", self.config.source_timeout),
            })?
            .map_err(|e| PipelineError::SourceUnavailable {
                source_name: source_name.clone(),
                message: e.to_string(),
            });

            let duration = fetch_started.elapsed();
            let fetched = match fetched {
                Ok(players) => {
                    self.metrics
                        .record_source_fetch(&source_name, true, duration, players.len());
                    players
                }
                Err(e) => {
                    self.metrics
                        .record_source_fetch(&source_name, false, duration, 0);
                    return Err(e);
                }
            };

            if fetched.is_empty() {
                return Err(PipelineError::EmptyData {
                    source_name: source_name.clone(),
                });
            }

            if let Err(e) = self.cache.set(&prediction_key, &fetched) {
                warn!("Failed to cache prediction fetch: {}", e);
            }
            Ok(fetched)
        };

        tokio::try_join!(rosters_fut, predictions_fut)
    }

    /// Build or reuse the per-position conversion ratios.
    ///
    /// Returns the ratios plus whether the default weight table had to stand
    /// in for the live one. Degraded ratios are never cached, so recovery is
    /// picked up on the next run rather than after the ratio TTL.
    async fn conversion_ratios(
        &self,
        ruleset: &str,
        force_refresh: bool,
    ) -> (BTreeMap<Position, ConversionRatio>, bool) {
        let ratios_key = format!("ratios:{}", ruleset);

        if !force_refresh {
            if let Some(cached) = self.cache.get::<Vec<ConversionRatio>>(&ratios_key) {
                debug!("Conversion ratios served from cache for '{}'", ruleset);
                let ratios = cached.into_iter().map(|r| (r.position, r)).collect();
                return (ratios, false);
            }
        }

        let weights = match timeout(
            self.config.source_timeout,
            self.ruleset_source.fetch_weights(ruleset),
        )
        .await
        {
            Ok(Ok(weights)) => Ok(weights),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.config.source_timeout)),
        };

        match weights {
            Ok(weights) => {
                let ratios = self.converter.build_ratios(&weights);
                let as_vec: Vec<ConversionRatio> = ratios.values().cloned().collect();
                if let Err(e) = self.cache.set(&ratios_key, &as_vec) {
                    warn!("Failed to cache conversion ratios: {}", e);
                }
                (ratios, false)
            }
            Err(message) => {
                let degraded = PipelineError::ConversionDegraded { message };
                warn!(
                    "{}; falling back to default weights for '{}'",
                    degraded, ruleset
                );
                self.metrics.record_weights_degraded();
                (self.converter.build_ratios(&default_target()), true)
            }
        }
    }

    /// Earliest gameweek still marked as a forecast, falling back to the
    /// latest settled gameweek plus one, clamped to the season length.
    fn derive_current_gameweek(&self, predictions: &[PredictedPlayer]) -> u32 {
        let season_length = self.converter.settings().season_length;

        let earliest_forecast = predictions
            .iter()
            .flat_map(|p| &p.gameweeks)
            .filter(|g| g.status == GameweekStatus::Forecast)
            .map(|g| g.gameweek)
            .min();

        let gameweek = earliest_forecast.unwrap_or_else(|| {
            predictions
                .iter()
                .flat_map(|p| &p.gameweeks)
                .filter(|g| g.status == GameweekStatus::Settled)
                .map(|g| g.gameweek)
                .max()
                .map(|gw| gw + 1)
                .unwrap_or(1)
        });

        gameweek.clamp(1, season_length)
    }

    /// Bounded fan-out over the roster collection: one match+convert unit of
    /// work per player, results reassembled in source order.
    async fn enrich_players(
        &self,
        rosters: Vec<RosterPlayer>,
        predictions: Vec<PredictedPlayer>,
        ratios: BTreeMap<Position, ConversionRatio>,
        gameweek: u32,
        options: &RunOptions,
    ) -> Result<Vec<EnrichedPlayer>, PipelineError> {
        let fallback = rosters.clone();
        let total = rosters.len();

        let context = Arc::new(EnrichContext {
            matcher: self.matcher.clone(),
            candidates: CandidateIndex::build(predictions),
            converter: self.converter.clone(),
            resolver: self.resolver.clone(),
            ratios,
            matching: self.config.matching.clone(),
            cache: self.cache.clone(),
            gameweek,
            force_refresh: options.force_refresh,
        });

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_enrichments));
        let mut join_set = JoinSet::new();

        for (idx, roster) in rosters.into_iter().enumerate() {
            let context = context.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("enrichment semaphore closed");
                (idx, enrich_player(&context, roster))
            });
        }

        let mut slots: Vec<Option<EnrichedPlayer>> = vec![None; total];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, player)) => slots[idx] = Some(player),
                Err(e) => error!("Enrichment task failed to join: {}", e),
            }
        }

        // A lost task (panic) downgrades that player rather than aborting
        let mut players = Vec::with_capacity(total);
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(player) => players.push(player),
                None => {
                    let roster = fallback[idx].clone();
                    warn!(
                        "Player '{}' enrichment task lost, keeping unenriched entry",
                        roster.name
                    );
                    players.push(unenriched_entry(
                        &context.resolver,
                        roster,
                        Some("enrichment task failed".to_string()),
                    ));
                }
            }
        }

        for player in &players {
            self.metrics.record_match_outcome(match player.method {
                Some(MatchMethod::CrossReference) => "cross-reference-id",
                Some(MatchMethod::NameTeam) => "name+team-heuristic",
                None => "unmatched",
            });
        }

        Ok(players)
    }

    fn record_success(&self, report: &IntegrationReport) {
        if let Ok(mut stats) = self.stats.write() {
            stats.runs_completed += 1;
            stats.players_enriched += report.totals.matched as u64;
            stats.last_match_rate = report.totals.match_rate;
            stats.last_run_at = Some(report.generated_at);
        }
    }

    fn record_failure(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.runs_failed += 1;
        }
    }
}

/// One unit of fan-out work: match one roster player, resolve its position
/// and convert its prediction. Failures are captured on the record.
fn enrich_player(context: &EnrichContext, roster: RosterPlayer) -> EnrichedPlayer {
    let match_key = format!("matches:{}", roster.id);

    // Reuse a cached identity match when its candidate is still present
    let cached = if context.force_refresh {
        None
    } else {
        context
            .cache
            .get::<CachedMatch>(&match_key)
            .and_then(|cached| {
                context
                    .candidates
                    .by_provider_id(&cached.predicted_id)
                    .map(|candidate| PlayerMatch {
                        roster: roster.clone(),
                        predicted: Some(candidate.clone()),
                        confidence: cached.confidence,
                        method: cached.method,
                    })
            })
    };

    let matched = cached.unwrap_or_else(|| {
        let result = context
            .matcher
            .match_player(&roster, &context.candidates, &context.matching);

        if let Some(predicted) = &result.predicted {
            let entry = CachedMatch {
                predicted_id: predicted.id.clone(),
                confidence: result.confidence,
                method: result.method,
            };
            if let Err(e) = context.cache.set(&match_key, &entry) {
                warn!("Failed to cache match for '{}': {}", roster.id, e);
            }
        }

        result
    });

    let resolved = context
        .resolver
        .resolve(&matched.roster, matched.predicted.as_ref());

    let scores = matched.predicted.as_ref().map(|predicted| {
        let ratio = &context.ratios[&resolved.position];
        context.converter.convert(predicted, ratio, context.gameweek)
    });

    EnrichedPlayer {
        id: matched.roster.id,
        name: matched.roster.name,
        team: matched.roster.team,
        owner: matched.roster.owner,
        opta_id: matched.roster.opta_id,
        position: resolved.position,
        position_defaulted: resolved.defaulted,
        scores,
        confidence: matched.confidence,
        method: matched.method,
        enhancement_error: None,
    }
}

/// Build an unenriched entry for a player whose enhancement failed
fn unenriched_entry(
    resolver: &PositionResolver,
    roster: RosterPlayer,
    enhancement_error: Option<String>,
) -> EnrichedPlayer {
    let resolved = resolver.resolve(&roster, None);
    EnrichedPlayer {
        id: roster.id,
        name: roster.name,
        team: roster.team,
        owner: roster.owner,
        opta_id: roster.opta_id,
        position: resolved.position,
        position_defaulted: resolved.defaulted,
        scores: None,
        confidence: MatchConfidence::Low,
        method: None,
        enhancement_error,
    }
}
