//! Pipeline Tester CLI Tool
//!
//! Command-line tool for exercising the integration pipeline against mock
//! sources, without any live upstream.
//!
//! Usage:
//!   cargo run --bin pipeline-tester -- list
//!   cargo run --bin pipeline-tester -- run --scenario happy-path
//!   cargo run --bin pipeline-tester -- run --scenario source-down
//!   cargo run --bin pipeline-tester -- run --scenario ambiguous-names --json

use anyhow::Result;
use clap::{Parser, Subcommand};
use scout_room::config::AppConfig;
use scout_room::scoring::ruleset::provider_basis;
use scout_room::service::AppState;
use scout_room::sources::{MockPredictionSource, MockRosterSource, MockRulesetSource};
use scout_room::types::{
    GameweekPrediction, GameweekStatus, PredictedPlayer, RosterPlayer, RunOptions,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pipeline-tester")]
#[command(about = "Exercise the scout-room integration pipeline against mock sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available scenarios
    List,
    /// Run one scenario and print the outcome
    Run {
        /// Scenario name (see `list`)
        #[arg(long, default_value = "happy-path")]
        scenario: String,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

const SCENARIOS: [(&str, &str); 5] = [
    ("happy-path", "cross-reference and heuristic matches succeed"),
    ("source-down", "prediction source fails; run aborts with no partial data"),
    ("ambiguous-names", "two candidates tie on the heuristic; player stays unmatched"),
    ("no-heuristics", "heuristic fallback disabled; only cross-reference ids match"),
    ("degraded-weights", "ruleset fetch fails; defaults applied and flagged"),
];

fn squad() -> Vec<RosterPlayer> {
    vec![
        roster("r1", "A. Smith", vec!["F"], "ABC", Some("X1")),
        roster("r2", "J. Doe", vec!["M"], "XYZ", None),
        roster("r3", "P. Keeper", vec!["G"], "ABC", Some("X3")),
        roster("r4", "Mystery Man", vec![], "QQQ", None),
    ]
}

fn candidates() -> Vec<PredictedPlayer> {
    vec![
        predicted("p1", "Andrew Smith", 4, "ABC", Some("X1"), 7.5),
        predicted("p2", "John Doe", 3, "XYZ", None, 5.0),
        predicted("p3", "Peter Keeper", 1, "ABC", Some("X3"), 4.0),
    ]
}

fn roster(
    id: &str,
    name: &str,
    codes: Vec<&str>,
    team: &str,
    opta_id: Option<&str>,
) -> RosterPlayer {
    RosterPlayer {
        id: id.to_string(),
        name: name.to_string(),
        position_codes: codes.into_iter().map(String::from).collect(),
        position: None,
        team: team.to_string(),
        owner: Some("mgr-1".to_string()),
        opta_id: opta_id.map(String::from),
    }
}

fn predicted(
    id: &str,
    name: &str,
    class: u8,
    team: &str,
    opta_id: Option<&str>,
    points: f64,
) -> PredictedPlayer {
    PredictedPlayer {
        id: id.to_string(),
        name: name.to_string(),
        position_class: Some(class),
        team: team.to_string(),
        opta_id: opta_id.map(String::from),
        gameweeks: (1..=5)
            .map(|gameweek| GameweekPrediction {
                gameweek,
                points,
                minutes: 90.0,
                status: if gameweek <= 2 {
                    GameweekStatus::Settled
                } else {
                    GameweekStatus::Forecast
                },
            })
            .collect(),
        season_points: points * 38.0,
    }
}

async fn run_scenario(scenario: &str, json: bool) -> Result<()> {
    let roster_source = Arc::new(MockRosterSource::with_players(squad()));
    let prediction_source = Arc::new(MockPredictionSource::with_players(candidates()));
    let ruleset_source = Arc::new(MockRulesetSource::with_weights(provider_basis()));

    let mut config = AppConfig::default();

    match scenario {
        "happy-path" | "degraded-weights" | "ambiguous-names" => {}
        "source-down" => prediction_source.set_failing(true),
        "no-heuristics" => config.pipeline.allow_heuristic_matching = false,
        other => {
            eprintln!("Unknown scenario '{}'; see `pipeline-tester list`", other);
            std::process::exit(2);
        }
    }

    if scenario == "degraded-weights" {
        ruleset_source.set_failing(true);
    }

    if scenario == "ambiguous-names" {
        // Add a second same-team John to force a heuristic tie
        let mut players = candidates();
        players.push(predicted("p4", "Jonathan Doe", 3, "XYZ", None, 3.0));
        prediction_source.set_players(players);
    }

    let app_state = AppState::with_sources(
        config,
        roster_source,
        prediction_source,
        ruleset_source,
    )?;
    app_state.start().await?;

    match app_state.run_integration(RunOptions::default()).await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Run {} ({})", report.run_id, report.ruleset);
            println!(
                "  players: {}  matched: {}  unmatched: {}  match rate: {:.1}%",
                report.totals.total,
                report.totals.matched,
                report.totals.unmatched,
                report.totals.match_rate
            );
            if report.weights_degraded {
                println!("  NOTE: target weights unavailable, defaults applied");
            }
            for player in &report.players {
                match &player.scores {
                    Some(scores) => println!(
                        "  {:<14} {:<4} {:>6.2} pts/season  (gw{}: {:.2}, {:?})",
                        player.name,
                        player.position.code(),
                        scores.season_total,
                        report.gameweek,
                        scores.current_gameweek,
                        player.confidence
                    ),
                    None => println!(
                        "  {:<14} {:<4} unmatched",
                        player.name,
                        player.position.code()
                    ),
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("Run failed: kind={}", e.kind());
            println!("  {}", e);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            println!("Available scenarios:");
            for (name, description) in SCENARIOS {
                println!("  {:<18} {}", name, description);
            }
            Ok(())
        }
        Commands::Run { scenario, json } => run_scenario(&scenario, json).await,
    }
}
