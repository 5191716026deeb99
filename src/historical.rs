//! Historical backfill: one snapshot per day over a date range.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::client::OddsApiClient;
use crate::odds::sport_label;
use crate::row::{write_rows, CsvLayout, Provenance, SnapshotRow};
use crate::timestamp::UtcHour;

pub const DEFAULT_START_DATE: &str = "2025-10-04";
pub const DEFAULT_END_DATE: &str = "2026-01-09";

/// Bookmakers kept from historical responses, with their CSV display names.
/// `williamhill_us` is Caesars' key in the API.
pub const HISTORICAL_BOOKMAKERS: [(&str, &str); 2] =
    [("betmgm", "betmgm"), ("williamhill_us", "caesars")];

fn display_name(bookmaker_key: &str) -> Option<&'static str> {
    HISTORICAL_BOOKMAKERS
        .iter()
        .find(|(key, _)| *key == bookmaker_key)
        .map(|(_, name)| *name)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("minute must be between 0 and 59, got {0}")]
pub struct InvalidMinute(pub u8);

/// Requested snapshot time of day, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotTime {
    hour: UtcHour,
    minute: u8,
}

impl SnapshotTime {
    pub fn new(hour: UtcHour, minute: u8) -> Result<Self, InvalidMinute> {
        if minute > 59 {
            return Err(InvalidMinute(minute));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> UtcHour {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// `YYYY-MM-DDTHH:MM:00Z` on `date`
    pub fn on(&self, date: NaiveDate) -> String {
        format!("{}T{}:{:02}:00Z", date.format("%Y-%m-%d"), self.hour, self.minute)
    }
}

/// Inputs of one historical run
#[derive(Debug, Clone)]
pub struct HistoricalRun {
    pub sport: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub snapshot_time: SnapshotTime,
    /// Non-empty label switches to labeled file names and skip rules.
    pub label: Option<String>,
    pub output_dir: PathBuf,
}

impl HistoricalRun {
    pub fn total_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1).max(0) as usize
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        match &self.label {
            Some(label) => format!("odds_{}_{}.csv", date.format("%Y-%m-%d"), label),
            None => format!("odds_{}.csv", date.format("%Y-%m-%d")),
        }
    }

    /// Output dir plus its parent, where base daily pulls land.
    fn tracked_dirs(&self) -> Vec<&Path> {
        let mut dirs = vec![self.output_dir.as_path()];
        if let Some(parent) = self.output_dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent);
        }
        dirs
    }

    /// Labeled runs skip only their exact file; unlabeled runs skip a day
    /// already pulled into any tracked directory.
    pub fn already_fetched(&self, date: NaiveDate) -> bool {
        if self.label.is_some() {
            return self.output_dir.join(self.file_name(date)).exists();
        }
        let plain = format!("odds_{}.csv", date.format("%Y-%m-%d"));
        self.tracked_dirs().iter().any(|dir| dir.join(&plain).exists())
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HistoricalSummary {
    pub total_days: usize,
    pub rows_written: usize,
    pub days_written: usize,
    pub days_skipped: usize,
    pub days_no_games: usize,
    pub days_failed: usize,
}

enum DayOutcome {
    Written(usize),
    NoGames,
}

/// Walk the date range, fetching and writing one snapshot per day.
///
/// Failures are logged per day and never stop the loop.
pub async fn run_historical(client: &OddsApiClient, run: &HistoricalRun) -> Result<HistoricalSummary> {
    let total_days = run.total_days();
    let mut summary = HistoricalSummary {
        total_days,
        ..Default::default()
    };

    if total_days == 0 {
        warn!("End date {} is before start date {}; nothing to fetch", run.end, run.start);
        return Ok(summary);
    }

    std::fs::create_dir_all(&run.output_dir)
        .with_context(|| format!("Failed to create {}", run.output_dir.display()))?;

    info!(
        "Fetching historical {} odds: {} to {} ({} days)",
        sport_label(&run.sport),
        run.start,
        run.end,
        total_days
    );
    info!("Output directory: {}/", run.output_dir.display());
    info!("Bookmakers: BetMGM, Caesars");
    info!("Markets: h2h, spreads, totals");
    info!(
        "Snapshot time: {}:{:02} UTC",
        run.snapshot_time.hour(),
        run.snapshot_time.minute()
    );

    for (idx, date) in run.start.iter_days().take(total_days).enumerate() {
        let day_num = idx + 1;

        if run.already_fetched(date) {
            summary.days_skipped += 1;
            let reason = if run.label.is_some() {
                "labeled file exists"
            } else {
                "already exists in tracked dirs"
            };
            info!("[{}/{}] {} - {}, skipping", day_num, total_days, date, reason);
            continue;
        }

        match fetch_day(client, run, date).await {
            Ok((DayOutcome::Written(rows), games, remaining)) => {
                summary.rows_written += rows;
                summary.days_written += 1;
                info!(
                    "[{}/{}] {} - {} rows, {} games (quota remaining: {})",
                    day_num, total_days, date, rows, games, remaining
                );
            }
            Ok((DayOutcome::NoGames, _, remaining)) => {
                summary.days_no_games += 1;
                info!(
                    "[{}/{}] {} - no games found (quota remaining: {})",
                    day_num, total_days, date, remaining
                );
            }
            Err(e) => {
                summary.days_failed += 1;
                match e.downcast_ref::<crate::client::FetchError>() {
                    Some(fetch) if fetch.is_http_status() => {
                        error!("[{}/{}] {} - HTTP error: {}", day_num, total_days, date, fetch)
                    }
                    _ => error!("[{}/{}] {} - Error: {:#}", day_num, total_days, date, e),
                }
            }
        }
    }

    info!(
        "Done! {} total rows written across {} days",
        summary.rows_written, summary.days_written
    );
    info!("  Days skipped (already existed): {}", summary.days_skipped);
    info!("  Days with no games: {}", summary.days_no_games);
    if summary.days_failed > 0 {
        warn!("  Days failed: {}", summary.days_failed);
    }

    Ok(summary)
}

async fn fetch_day(
    client: &OddsApiClient,
    run: &HistoricalRun,
    date: NaiveDate,
) -> Result<(DayOutcome, usize, String)> {
    let snapshot_at = run.snapshot_time.on(date);
    let (response, meta) = client.fetch_historical_odds(&run.sport, &snapshot_at).await?;

    let provenance = Provenance {
        date: date.format("%Y-%m-%d").to_string(),
        sport: sport_label(&run.sport),
        snapshot_taken_at_utc: snapshot_at,
        api_snapshot_timestamp_utc: response.timestamp.clone(),
        response_received_at_utc: meta.received_at.clone(),
    };

    let rows: Vec<SnapshotRow> = response
        .data
        .iter()
        .flat_map(|game| {
            let provenance = &provenance;
            game.bookmakers.iter().filter_map(move |bookmaker| {
                display_name(&bookmaker.key)
                    .map(|name| SnapshotRow::new(game, bookmaker, name, provenance))
            })
        })
        .collect();

    let games = response.data.len();
    if rows.is_empty() {
        return Ok((DayOutcome::NoGames, games, meta.requests_remaining));
    }

    let path = run.output_dir.join(run.file_name(date));
    write_rows(&path, CsvLayout::TimestampAware, &rows)?;
    Ok((DayOutcome::Written(rows.len()), games, meta.requests_remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dir: &Path, label: Option<&str>) -> HistoricalRun {
        HistoricalRun {
            sport: "icehockey_nhl".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            snapshot_time: SnapshotTime::new(UtcHour::default(), 0).unwrap(),
            label: label.map(str::to_string),
            output_dir: dir.join("odds-data").join("historical"),
        }
    }

    #[test]
    fn snapshot_time_formats_request_date() {
        let t = SnapshotTime::new(UtcHour::new(16).unwrap(), 30).unwrap();
        assert_eq!(
            t.on(NaiveDate::from_ymd_opt(2025, 12, 24).unwrap()),
            "2025-12-24T16:30:00Z"
        );
        assert_eq!(SnapshotTime::new(UtcHour::default(), 60), Err(InvalidMinute(60)));
    }

    #[test]
    fn snapshot_time_exposes_validated_parts() {
        let t = SnapshotTime::new(UtcHour::new(7).unwrap(), 59).unwrap();
        assert_eq!(t.hour(), UtcHour::new(7).unwrap());
        assert_eq!(t.minute(), 59);
        assert_eq!(t.on(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()), "2024-01-05T07:59:00Z");
    }

    #[test]
    fn day_count_is_inclusive_and_never_negative() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = run(dir.path(), None);
        assert_eq!(r.total_days(), 3);
        r.end = r.start;
        assert_eq!(r.total_days(), 1);
        r.end = r.start.pred_opt().unwrap();
        assert_eq!(r.total_days(), 0);
    }

    #[test]
    fn file_names_follow_label() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(run(dir.path(), None).file_name(date), "odds_2024-01-05.csv");
        assert_eq!(
            run(dir.path(), Some("open_9pm_pst")).file_name(date),
            "odds_2024-01-05_open_9pm_pst.csv"
        );
    }

    #[test]
    fn unlabeled_run_skips_days_pulled_into_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let r = run(dir.path(), None);
        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert!(!r.already_fetched(date));

        let parent = dir.path().join("odds-data");
        std::fs::create_dir_all(&parent).unwrap();
        std::fs::write(parent.join("odds_2024-01-06.csv"), "date\r\n").unwrap();
        assert!(r.already_fetched(date));
    }

    #[test]
    fn labeled_run_ignores_plain_daily_files() {
        let dir = tempfile::tempdir().unwrap();
        let r = run(dir.path(), Some("open"));
        std::fs::create_dir_all(&r.output_dir).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        std::fs::write(r.output_dir.join("odds_2024-01-05.csv"), "date\r\n").unwrap();
        assert!(!r.already_fetched(date));

        std::fs::write(r.output_dir.join("odds_2024-01-05_open.csv"), "date\r\n").unwrap();
        assert!(r.already_fetched(date));
    }

    #[test]
    fn only_tracked_bookmakers_have_display_names() {
        assert_eq!(display_name("williamhill_us"), Some("caesars"));
        assert_eq!(display_name("betmgm"), Some("betmgm"));
        assert_eq!(display_name("draftkings"), None);
    }
}
