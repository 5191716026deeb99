//! Snapshot time inference from odds CSV file names.
//!
//! Rules, first match wins:
//! - `odds_<date>_<label>_<YYYYMMDDTHHMMSSZ>.csv` uses the embedded stamp
//! - `odds_<date>.csv` under a `historical` directory uses the historical hour
//! - `odds_<date>.csv` anywhere else is midnight UTC

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Directory segment that marks historical pulls.
pub const HISTORICAL_DIR: &str = "historical";

/// Default hour for historical snapshots: noon Eastern.
pub const DEFAULT_HISTORICAL_HOUR_UTC: u8 = 17;

/// Hour of day in UTC, 0-23.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcHour(u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("hour must be between 0 and 23, got {0}")]
pub struct InvalidHour(pub i64);

impl UtcHour {
    pub fn new(hour: u8) -> Result<Self, InvalidHour> {
        if hour <= 23 {
            Ok(Self(hour))
        } else {
            Err(InvalidHour(hour.into()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for UtcHour {
    fn default() -> Self {
        Self(DEFAULT_HISTORICAL_HOUR_UTC)
    }
}

impl fmt::Display for UtcHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for UtcHour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a whole hour"))?;
        u8::try_from(raw)
            .map_err(|_| InvalidHour(raw))
            .and_then(UtcHour::new)
            .map_err(|e| e.to_string())
    }
}

fn timestamped_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^odds_([0-9]{4}-[0-9]{2}-[0-9]{2})_[^_]+_([0-9]{8}T[0-9]{6}Z)\.csv$")
            .expect("timestamped filename pattern is valid")
    })
}

fn bare_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^odds_([0-9]{4}-[0-9]{2}-[0-9]{2})\.csv$")
            .expect("bare date filename pattern is valid")
    })
}

/// `20240105T170000Z` -> `2024-01-05T17:00:00Z`. `raw` is ASCII, as
/// [`timestamped_re`] only captures `[0-9]`, `T` and `Z`.
fn expand_compact(raw: &str) -> String {
    format!(
        "{}-{}-{}T{}:{}:{}Z",
        &raw[0..4],
        &raw[4..6],
        &raw[6..8],
        &raw[9..11],
        &raw[11..13],
        &raw[13..15]
    )
}

/// Infer `snapshot_taken_at_utc` for a file name.
///
/// `under_historical_dir` decides between the two bare-date rules, which
/// share a pattern. Returns `None` when nothing matches.
pub fn infer(file_name: &str, historical_hour: UtcHour, under_historical_dir: bool) -> Option<String> {
    if let Some(caps) = timestamped_re().captures(file_name) {
        return Some(expand_compact(&caps[2]));
    }

    let caps = bare_date_re().captures(file_name)?;
    let date = &caps[1];
    if under_historical_dir {
        Some(format!("{date}T{historical_hour}:00:00Z"))
    } else {
        Some(format!("{date}T00:00:00Z"))
    }
}

/// True when any component of `path` is exactly `historical`.
pub fn is_under_historical_dir(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == HISTORICAL_DIR)
}

/// [`infer`] with the directory flag taken from the path itself.
pub fn infer_for_path(path: &Path, historical_hour: UtcHour) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    infer(name, historical_hour, is_under_historical_dir(path))
}
