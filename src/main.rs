//! NHL Odds Snapshot CLI
//!
//! Pulls odds snapshots from The Odds API into CSV files and backfills
//! provenance timestamps in files written by older versions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use odds_snapshots::backfill::{run_backfill, DEFAULT_PATHS};
use odds_snapshots::client::OddsApiClient;
use odds_snapshots::config::{ApiConfig, ApiKind, DEFAULT_SPORT};
use odds_snapshots::historical::{
    run_historical, HistoricalRun, SnapshotTime, DEFAULT_END_DATE, DEFAULT_START_DATE,
};
use odds_snapshots::live::{normalize_label, run_live_snapshot};
use odds_snapshots::timestamp::UtcHour;

#[derive(Parser, Debug)]
#[command(name = "odds-snapshots")]
#[command(about = "Fetch NHL odds snapshots from The Odds API and maintain the CSV archive")]
#[command(version)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take one live snapshot of current odds.
    Fetch {
        /// Label embedded in the output file name (default: snapshot).
        #[arg(long, env = "ODDS_SNAPSHOT_LABEL")]
        label: Option<String>,
    },

    /// Fetch one historical snapshot per day over a date range.
    Historical {
        /// Start date (YYYY-MM-DD).
        #[arg(default_value = DEFAULT_START_DATE, value_parser = parse_date)]
        start_date: NaiveDate,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(default_value = DEFAULT_END_DATE, value_parser = parse_date)]
        end_date: NaiveDate,

        /// Snapshot hour UTC (0-23).
        #[arg(long, default_value_t = UtcHour::default())]
        snapshot_hour_utc: UtcHour,

        /// Snapshot minute UTC (0-59).
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=59))]
        snapshot_minute_utc: u8,

        /// Optional label to store an additional same-day snapshot (example: open_9pm_pst).
        #[arg(long, default_value = "")]
        snapshot_label: String,

        /// Sport key (default: first of ODDS_SPORTS).
        #[arg(long)]
        sport: Option<String>,
    },

    /// Backfill timestamp columns in existing odds CSV files, no API calls.
    Backfill {
        /// Directories/files to process.
        #[arg(long, num_args = 1.., default_values = DEFAULT_PATHS)]
        paths: Vec<PathBuf>,

        /// Hour used when inferring historical snapshot_taken_at_utc.
        #[arg(long, default_value_t = UtcHour::default())]
        historical_hour_utc: UtcHour,

        /// Report changes without writing files.
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("'{raw}' is not YYYY-MM-DD: {e}"))
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("odds_snapshots=info".parse()?);
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.log_format)?;

    match cli.command {
        Command::Fetch { label } => {
            let config = ApiConfig::from_env(ApiKind::Live).context("Invalid live API configuration")?;
            let client = OddsApiClient::new(&config)?;
            let label = normalize_label(label.as_deref());
            run_live_snapshot(&client, &config, &label, Utc::now()).await?;
        }
        Command::Historical {
            start_date,
            end_date,
            snapshot_hour_utc,
            snapshot_minute_utc,
            snapshot_label,
            sport,
        } => {
            let snapshot_time = SnapshotTime::new(snapshot_hour_utc, snapshot_minute_utc)?;
            let config = ApiConfig::from_env(ApiKind::Historical)
                .context("Invalid historical API configuration")?;
            let client = OddsApiClient::new(&config)?;

            let label = snapshot_label.trim();
            let run = HistoricalRun {
                sport: sport
                    .or_else(|| config.sports.first().cloned())
                    .unwrap_or_else(|| DEFAULT_SPORT.to_string()),
                start: start_date,
                end: end_date,
                snapshot_time,
                label: (!label.is_empty()).then(|| label.to_string()),
                output_dir: config.historical_output_dir.clone(),
            };
            run_historical(&client, &run).await?;
        }
        Command::Backfill {
            paths,
            historical_hour_utc,
            dry_run,
        } => {
            let summary = run_backfill(&paths, historical_hour_utc, dry_run)
                .context("Failed to scan backfill paths")?;
            if summary.failed > 0 {
                info!("{} files could not be processed", summary.failed);
            }
        }
    }

    Ok(())
}
