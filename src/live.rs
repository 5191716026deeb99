//! Live snapshot: current odds for each configured sport into one labeled CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::client::OddsApiClient;
use crate::config::ApiConfig;
use crate::odds::sport_label;
use crate::row::{write_rows, CsvLayout, Provenance, SnapshotRow};

pub const DEFAULT_LABEL: &str = "snapshot";

/// Trimmed, lower-cased label; blank falls back to `snapshot`.
pub fn normalize_label(raw: Option<&str>) -> String {
    let label = raw.unwrap_or_default().trim().to_lowercase();
    if label.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        label
    }
}

/// `odds_<date>_<label>_<YYYYMMDDTHHMMSSZ>.csv`
pub fn snapshot_file_name(taken_at: DateTime<Utc>, label: &str) -> String {
    format!(
        "odds_{}_{}_{}.csv",
        taken_at.format("%Y-%m-%d"),
        label,
        taken_at.format("%Y%m%dT%H%M%SZ")
    )
}

/// Result of a live run
#[derive(Debug, Default)]
pub struct LiveSummary {
    pub rows_written: usize,
    pub output_file: Option<PathBuf>,
    pub sports_failed: usize,
}

/// Fetch every configured sport once and write whatever came back.
pub async fn run_live_snapshot(
    client: &OddsApiClient,
    config: &ApiConfig,
    label: &str,
    taken_at: DateTime<Utc>,
) -> Result<LiveSummary> {
    let today = taken_at.format("%Y-%m-%d").to_string();
    let snapshot_taken_at_utc = taken_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    std::fs::create_dir_all(&config.live_output_dir).with_context(|| {
        format!("Failed to create {}", config.live_output_dir.display())
    })?;
    let output_file = config
        .live_output_dir
        .join(snapshot_file_name(taken_at, label));

    info!("Fetching odds for {} ({})...", today, label);

    let mut summary = LiveSummary::default();
    let mut rows = Vec::new();

    for sport in &config.sports {
        let sport_name = sport_label(sport);
        info!("Fetching {} odds...", sport_name);

        match client.fetch_odds(sport).await {
            Ok((games, meta)) => {
                info!("Found {} games", games.len());
                let provenance = Provenance {
                    date: today.clone(),
                    sport: String::new(),
                    snapshot_taken_at_utc: snapshot_taken_at_utc.clone(),
                    api_snapshot_timestamp_utc: String::new(),
                    response_received_at_utc: meta.received_at,
                };

                for game in &games {
                    let provenance = Provenance {
                        sport: game.sport_label(),
                        ..provenance.clone()
                    };
                    for bookmaker in &game.bookmakers {
                        rows.push(SnapshotRow::new(game, bookmaker, &bookmaker.key, &provenance));
                    }
                }
            }
            Err(e) if e.is_http_status() => {
                summary.sports_failed += 1;
                error!("Error fetching {}: {}", sport_name, e);
            }
            Err(e) => {
                summary.sports_failed += 1;
                error!("Unexpected error for {}: {}", sport_name, e);
            }
        }
    }

    if rows.is_empty() {
        warn!("No odds data found.");
        return Ok(summary);
    }

    write_rows(&output_file, CsvLayout::TimestampAware, &rows)?;
    info!("Wrote {} rows to {}", rows.len(), output_file.display());

    summary.rows_written = rows.len();
    summary.output_file = Some(output_file);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::infer;
    use crate::timestamp::UtcHour;
    use chrono::TimeZone;

    #[test]
    fn label_is_normalized() {
        assert_eq!(normalize_label(None), "snapshot");
        assert_eq!(normalize_label(Some("   ")), "snapshot");
        assert_eq!(normalize_label(Some(" Open ")), "open");
    }

    #[test]
    fn file_name_embeds_compact_stamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 17, 0, 0).unwrap();
        let name = snapshot_file_name(at, "open");
        assert_eq!(name, "odds_2024-01-05_open_20240105T170000Z.csv");
        // Backfill can recover the exact snapshot time from it
        assert_eq!(
            infer(&name, UtcHour::default(), false).as_deref(),
            Some("2024-01-05T17:00:00Z")
        );
    }
}
