//! In-place backfill of provenance timestamp columns in existing odds CSVs.
//!
//! No API calls are made. Only `snapshot_taken_at_utc` is ever inferred, and
//! only into empty cells; the other three columns are added or padded empty.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::row::{csv_writer, SNAPSHOT_TAKEN_AT, TIMESTAMP_COLUMNS};
use crate::timestamp::{infer_for_path, UtcHour};

pub const DEFAULT_PATHS: [&str; 2] = ["odds-data/historical", "odds-data"];

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("empty/no header")]
    NoHeader,

    #[error("record {record} has {found} fields but the header has {expected}")]
    RaggedRow {
        record: usize,
        found: usize,
        expected: usize,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Updated,
    HeaderOnly,
    UpToDate,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reason::Updated => "updated",
            Reason::HeaderOnly => "header-only update",
            Reason::UpToDate => "already up to date",
        })
    }
}

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcome {
    pub changed: bool,
    pub reason: Reason,
}

impl FileOutcome {
    fn new(changed: bool, reason_if_changed: Reason) -> Self {
        Self {
            changed,
            reason: if changed { reason_if_changed } else { Reason::UpToDate },
        }
    }
}

/// Files a batch would touch: `.csv` paths as given, directories walked
/// recursively for `odds_*.csv` in path order. Missing paths are skipped.
pub fn collect_csv_files(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for base in paths {
        if base.is_file() {
            if base.extension().is_some_and(|ext| ext == "csv") {
                files.push(base.clone());
            }
        } else if base.is_dir() {
            let mut found = Vec::new();
            walk_odds_files(base, &mut found)?;
            found.sort();
            files.extend(found);
        } else {
            debug!("Skipping missing path {}", base.display());
        }
    }
    Ok(files)
}

/// Symlinked directories are not followed. Only an unreadable root is an
/// error; unreadable subdirectories are logged and skipped.
fn walk_odds_files(root: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut pending = vec![std::fs::read_dir(root)?];
    while let Some(entries) = pending.pop() {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => match std::fs::read_dir(&path) {
                    Ok(sub) => pending.push(sub),
                    Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
                },
                Ok(_) if is_odds_csv(&path) => out.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }
    Ok(())
}

fn is_odds_csv(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("odds_") && n.ends_with(".csv"))
}

/// Header plus records, each record paired with its original field count.
type Table = (Vec<String>, Vec<(usize, Vec<String>)>);

fn read_table(path: &Path) -> Result<Table, BackfillError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(File::open(path)?);

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(str::to_string).collect(),
        None => return Err(BackfillError::NoHeader),
    };
    if header.iter().all(|h| h.is_empty()) {
        return Err(BackfillError::NoHeader);
    }

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record?;
        if record.len() > header.len() {
            return Err(BackfillError::RaggedRow {
                record: idx + 1,
                found: record.len(),
                expected: header.len(),
            });
        }
        rows.push((record.len(), record.iter().map(str::to_string).collect()));
    }
    Ok((header, rows))
}

/// Backfill one file, rewriting it only when something changed and
/// `dry_run` is off.
pub fn process_file(path: &Path, historical_hour: UtcHour, dry_run: bool) -> Result<FileOutcome, BackfillError> {
    let (mut header, mut rows) = read_table(path)?;

    let mut changed = false;
    for col in TIMESTAMP_COLUMNS {
        if !header.iter().any(|h| h == col) {
            header.push(col.to_string());
            changed = true;
        }
    }

    if rows.is_empty() {
        if changed && !dry_run {
            let mut writer = csv_writer(path)?;
            writer.write_record(&header)?;
            writer.flush()?;
        }
        return Ok(FileOutcome::new(changed, Reason::HeaderOnly));
    }

    let column = |name: &str| header.iter().position(|h| h == name);
    let snapshot_idx = column(SNAPSHOT_TAKEN_AT);
    let padded_idx: Vec<usize> = TIMESTAMP_COLUMNS[1..]
        .iter()
        .filter_map(|&c| column(c))
        .collect();

    let inferred = infer_for_path(path, historical_hour);

    for (present, fields) in &mut rows {
        fields.resize(header.len(), String::new());

        if let (Some(idx), Some(ts)) = (snapshot_idx, inferred.as_deref()) {
            if fields[idx].is_empty() {
                fields[idx] = ts.to_string();
                changed = true;
            }
        }
        // Cells past the end of a short record were absent, not empty
        if padded_idx.iter().any(|&idx| idx >= *present) {
            changed = true;
        }
    }

    if changed && !dry_run {
        let mut writer = csv_writer(path)?;
        writer.write_record(&header)?;
        for (_, fields) in &rows {
            writer.write_record(fields)?;
        }
        writer.flush()?;
    }

    Ok(FileOutcome::new(changed, Reason::Updated))
}

/// Batch totals
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Run the backfill over every discovered file. Per-file failures are
/// reported and counted as unchanged; the batch always completes.
pub fn run_backfill(paths: &[PathBuf], historical_hour: UtcHour, dry_run: bool) -> std::io::Result<BackfillSummary> {
    let files = collect_csv_files(paths)?;
    let mut summary = BackfillSummary {
        scanned: files.len(),
        ..Default::default()
    };

    for path in &files {
        match process_file(path, historical_hour, dry_run) {
            Ok(outcome) if outcome.changed => {
                summary.updated += 1;
                info!("UPDATED {} ({})", path.display(), outcome.reason);
            }
            Ok(outcome) => {
                summary.unchanged += 1;
                debug!("{} ({})", path.display(), outcome.reason);
            }
            Err(e) => {
                summary.unchanged += 1;
                summary.failed += 1;
                warn!("SKIPPED {} ({})", path.display(), e);
            }
        }
    }

    let mode = if dry_run { "DRY RUN" } else { "WRITE" };
    info!(
        "{} complete: {} updated, {} unchanged, {} scanned",
        mode, summary.updated, summary.unchanged, summary.scanned
    );

    Ok(summary)
}
