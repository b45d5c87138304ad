//! Main entry point for the Scout Room integration service
//!
//! This is the production entry point that initializes and runs the
//! integration service with proper error handling, logging, and graceful
//! shutdown.

use anyhow::Result;
use clap::Parser;
use scout_room::config::AppConfig;
use scout_room::metrics::{HealthServer, HealthServerConfig};
use scout_room::service::{AppState, HealthCheck, HealthStatus};
use scout_room::types::RunOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Scout Room Integration Service - player prediction aggregation and scoring conversion
#[derive(Parser)]
#[command(
    name = "scout-room",
    version,
    about = "A player prediction integration microservice for fantasy football leagues",
    long_about = "Scout Room fetches roster/ownership data from a fantasy-league platform and \
                 player predictions from an external provider, reconciles the two player \
                 identity spaces, converts points between scoring rulesets, and serves the \
                 merged, cached result over HTTP."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Run one integration pass, print the report as JSON and exit
    #[arg(long, help = "Run a single integration pass and print the report")]
    run_once: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Disable the name+team heuristic matching fallback
    #[arg(long, help = "Disable heuristic matching; cross-reference ids only")]
    no_heuristics: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = AppState::new(config).await?;
    app_state.start().await?;
    let app_state = Arc::new(app_state);

    match HealthCheck::check(app_state).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Runs Completed: {}", health.stats.runs_completed);
            println!("  Runs Failed: {}", health.stats.runs_failed);
            println!("  Players Enriched: {}", health.stats.players_enriched);
            println!("  Last Match Rate: {:.1}%", health.stats.last_match_rate);
            println!("  Uptime: {}", health.stats.uptime_info);

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run a single integration pass and print the report to stdout
async fn perform_single_run(config: AppConfig) -> Result<()> {
    let app_state = AppState::new(config).await?;
    app_state.start().await?;

    match app_state.run_integration(RunOptions::default()).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Integration run failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Scout Room Integration Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   HTTP port: {}", config.service.health_port);
    info!("   League source: {}", config.sources.league_base_url);
    info!(
        "   Prediction source: {}",
        config.sources.prediction_base_url
    );
    info!(
        "   Heuristic matching: {}",
        config.pipeline.allow_heuristic_matching
    );
    info!("   Default ruleset: {}", config.pipeline.default_ruleset);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.health_port = http_port;
    }

    if args.no_heuristics {
        config.pipeline.allow_heuristic_matching = false;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Handle special modes
    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.run_once {
        return perform_single_run(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Initialize application state
    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let app_state = Arc::new(app_state);

    // Start the HTTP surface (health, metrics, stats, integrate)
    let health_server = Arc::new(
        HealthServer::new(
            HealthServerConfig {
                port: config.service.health_port,
                host: "0.0.0.0".to_string(),
            },
            app_state.metrics(),
        )
        .with_app_state(app_state.clone()),
    );

    let server_task = {
        let health_server = health_server.clone();
        tokio::spawn(async move {
            if let Err(e) = health_server.start().await {
                error!("HTTP server error: {}", e);
            }
        })
    };

    info!("Scout Room Integration Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("Shutdown signal received, beginning graceful shutdown...");

    if let Err(e) = health_server.stop().await {
        warn!("Failed to stop HTTP server cleanly: {}", e);
    }
    if let Err(e) = app_state.stop().await {
        warn!("Failed to stop service components cleanly: {}", e);
    }

    match tokio::time::timeout(config.shutdown_timeout(), server_task).await {
        Ok(_) => {
            info!("Graceful shutdown completed successfully");
        }
        Err(_) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("Scout Room Integration Service stopped");
    Ok(())
}
