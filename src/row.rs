//! Output rows and the CSV writer.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Number;

use crate::extract::{extract, MarketLines};
use crate::odds::{Bookmaker, OddsApiEvent};

pub const SNAPSHOT_TAKEN_AT: &str = "snapshot_taken_at_utc";
pub const API_SNAPSHOT_TIMESTAMP: &str = "api_snapshot_timestamp_utc";
pub const RESPONSE_RECEIVED_AT: &str = "response_received_at_utc";
pub const BOOKMAKER_LAST_UPDATE: &str = "bookmaker_last_update_utc";

/// Provenance columns, in file order.
pub const TIMESTAMP_COLUMNS: [&str; 4] = [
    SNAPSHOT_TAKEN_AT,
    API_SNAPSHOT_TIMESTAMP,
    RESPONSE_RECEIVED_AT,
    BOOKMAKER_LAST_UPDATE,
];

const IDENTITY_COLUMNS: [&str; 4] = ["date", "sport", "game_id", "commence_time"];

const MARKET_COLUMNS: [&str; 12] = [
    "home_team",
    "away_team",
    "bookmaker",
    "ml_home",
    "ml_away",
    "spread_home",
    "spread_home_odds",
    "spread_away",
    "spread_away_odds",
    "total_line",
    "total_over_odds",
    "total_under_odds",
];

/// Column set of an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// Legacy daily files without provenance columns.
    Plain,
    TimestampAware,
}

impl CsvLayout {
    pub fn columns(self) -> Vec<&'static str> {
        let mut cols = IDENTITY_COLUMNS.to_vec();
        if self == CsvLayout::TimestampAware {
            cols.extend_from_slice(&TIMESTAMP_COLUMNS);
        }
        cols.extend_from_slice(&MARKET_COLUMNS);
        cols
    }
}

/// When and how a snapshot was taken. Empty strings mean unknown.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    /// `YYYY-MM-DD` of the snapshot.
    pub date: String,
    pub sport: String,
    pub snapshot_taken_at_utc: String,
    pub api_snapshot_timestamp_utc: String,
    pub response_received_at_utc: String,
}

/// One CSV record per (game, bookmaker).
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub date: String,
    pub sport: String,
    pub game_id: String,
    pub commence_time: String,
    pub snapshot_taken_at_utc: String,
    pub api_snapshot_timestamp_utc: String,
    pub response_received_at_utc: String,
    pub bookmaker_last_update_utc: String,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: String,
    pub lines: MarketLines,
}

impl SnapshotRow {
    pub fn new(
        game: &OddsApiEvent,
        bookmaker: &Bookmaker,
        bookmaker_name: &str,
        provenance: &Provenance,
    ) -> Self {
        Self {
            date: provenance.date.clone(),
            sport: provenance.sport.clone(),
            game_id: game.id.clone(),
            commence_time: game.commence_time.clone(),
            snapshot_taken_at_utc: provenance.snapshot_taken_at_utc.clone(),
            api_snapshot_timestamp_utc: provenance.api_snapshot_timestamp_utc.clone(),
            response_received_at_utc: provenance.response_received_at_utc.clone(),
            bookmaker_last_update_utc: bookmaker.last_update.clone(),
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            bookmaker: bookmaker_name.to_string(),
            lines: extract(game, bookmaker),
        }
    }

    /// Field values in the order of `layout.columns()`.
    pub fn record(&self, layout: CsvLayout) -> Vec<String> {
        let mut out = vec![
            self.date.clone(),
            self.sport.clone(),
            self.game_id.clone(),
            self.commence_time.clone(),
        ];
        if layout == CsvLayout::TimestampAware {
            out.extend([
                self.snapshot_taken_at_utc.clone(),
                self.api_snapshot_timestamp_utc.clone(),
                self.response_received_at_utc.clone(),
                self.bookmaker_last_update_utc.clone(),
            ]);
        }
        out.extend([
            self.home_team.clone(),
            self.away_team.clone(),
            self.bookmaker.clone(),
        ]);
        let l = &self.lines;
        out.extend(
            [
                &l.ml_home,
                &l.ml_away,
                &l.spread_home,
                &l.spread_home_odds,
                &l.spread_away,
                &l.spread_away_odds,
                &l.total_line,
                &l.total_over_odds,
                &l.total_under_odds,
            ]
            .into_iter()
            .map(cell),
        );
        out
    }
}

fn cell(value: &Option<Number>) -> String {
    value.as_ref().map(Number::to_string).unwrap_or_default()
}

/// Writer configured the way every file in the data directories is written.
pub fn csv_writer(path: &Path) -> csv::Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)
}

/// Write header plus rows, replacing any existing file.
pub fn write_rows(path: &Path, layout: CsvLayout, rows: &[SnapshotRow]) -> Result<()> {
    let mut writer =
        csv_writer(path).with_context(|| format!("Failed to open {} for writing", path.display()))?;
    writer.write_record(layout.columns())?;
    for row in rows {
        writer.write_record(row.record(layout))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}
