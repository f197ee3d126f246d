//! Seasonal AniList ETL CLI application.

use anyhow::{bail, Context, Result};
use clap::Parser;
use season_etl::{AniListClient, Fetcher, Pipeline, RunStatus, Shutdown, ShutdownTrigger};
use shared::{Config, Database};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// First season year to load
    #[arg(required_unless_present = "init_db")]
    start_year: Option<i32>,

    /// Year to stop at (exclusive)
    #[arg(required_unless_present = "init_db")]
    end_year: Option<i32>,

    /// Seconds to wait between (year, season) units
    cooldown: Option<u64>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only create the database schema, then exit
    #[arg(long)]
    init_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let years = match (args.start_year, args.end_year) {
        (Some(start), Some(end)) if start >= end => {
            bail!("start year ({}) must be before end year ({})", start, end)
        }
        (Some(start), Some(end)) => start..end,
        _ => 0..0,
    };

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()
    };

    shared::logging::init(shared::LogConfig {
        log_dir: config.log_dir().to_string_lossy().to_string(),
        component: "season-etl".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!("Seasonal ETL starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Create the schema up front so a run against a fresh path has tables
    let db_path = config.database_path();
    info!(db_path = %db_path.display(), "Opening database");
    let database = Database::open(&db_path).context("Failed to open database")?;
    drop(database);

    if args.init_db {
        info!("Database schema initialized");
        return Ok(());
    }

    let client = AniListClient::from_config(&config.anilist)
        .context("Failed to create AniList client")?;
    info!(endpoint = client.endpoint(), "AniList client ready");

    let fetcher = Fetcher::new(client).with_rate_limit_floor(config.anilist.rate_limit_floor);
    let cooldown = Duration::from_secs(args.cooldown.unwrap_or(config.anilist.cooldown_secs));

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(shutdown_signal(trigger));

    let mut pipeline = Pipeline::new(fetcher, &db_path, cooldown, shutdown);
    let (status, stats) = pipeline.run(years).await;

    info!("=== Run Summary ===");
    info!("Units processed: {}", stats.units);
    info!("Units without entries: {}", stats.units_no_entries);
    info!("Units committed: {}", stats.units_committed);
    info!("Units cut short: {}", stats.units_truncated);
    info!("Units failed: {}", stats.units_failed);
    info!("Rows inserted: {}", stats.rows.inserted);
    info!("Duplicate rows skipped: {}", stats.rows.duplicates);
    info!("Rows rejected: {}", stats.rows.rejected);

    match status {
        RunStatus::Completed => info!("Seasonal ETL finished successfully"),
        RunStatus::Cancelled => warn!("Seasonal ETL cancelled, completed units are kept"),
    }

    Ok(())
}

/// Fire the shutdown trigger on Ctrl+C
async fn shutdown_signal(trigger: ShutdownTrigger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, stopping after the current step");
            trigger.trigger();
        }
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
