//! Environment-driven configuration for the fetch commands.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_SPORT: &str = "icehockey_nhl";
pub const LIVE_BOOKMAKERS: &str = "betmgm,caesars";

const SECRET_FILE: &str = "/run/secrets/odds_api_key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is set but empty")]
    EmptyVar(&'static str),

    #[error("{0} appears to be a placeholder value; replace with your real key")]
    PlaceholderKey(&'static str),

    #[error("no API key: set {vars} or mount a secret at {path}")]
    MissingKey { vars: String, path: &'static str },
}

/// Which endpoint family a command talks to; decides the key variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Live,
    Historical,
}

impl ApiKind {
    fn key_vars(self) -> &'static [&'static str] {
        match self {
            ApiKind::Live => &["ODDS_API_KEY"],
            ApiKind::Historical => &["HISTORICAL_ODDS_API_KEY", "ODDS_API_KEY"],
        }
    }
}

/// Configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    /// `bookmakers` query filter; the historical endpoint filters client side.
    pub bookmakers: Option<String>,
    pub sports: Vec<String>,
    pub live_output_dir: PathBuf,
    pub historical_output_dir: PathBuf,
}

impl ApiConfig {
    pub fn from_env(kind: ApiKind) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(kind, |name| env::var(name).ok())?;

        let base_url = non_empty_var("ODDS_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let sports = non_empty_var("ODDS_SPORTS")
            .map(|v| parse_sports(&v))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SPORT.to_string()]);

        let bookmakers = match kind {
            ApiKind::Live => Some(LIVE_BOOKMAKERS.to_string()),
            ApiKind::Historical => None,
        };

        Ok(Self {
            api_key,
            base_url,
            bookmakers,
            sports,
            live_output_dir: non_empty_var("ODDS_LIVE_OUTPUT_DIR")
                .unwrap_or_else(|| "data".to_string())
                .into(),
            historical_output_dir: non_empty_var("ODDS_HISTORICAL_OUTPUT_DIR")
                .unwrap_or_else(|| "odds-data/historical".to_string())
                .into(),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_sports(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Key from the first set variable, falling back to the secret file.
fn resolve_api_key(
    kind: ApiKind,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let vars = kind.key_vars();
    let key = match vars.iter().find_map(|&name| lookup(name).map(|v| (name, v))) {
        Some((name, v)) if v.trim().is_empty() => return Err(ConfigError::EmptyVar(name)),
        Some((name, v)) => {
            check_not_placeholder(&v, name)?;
            v.trim().to_string()
        }
        None => match read_secret_file(SECRET_FILE) {
            Some(v) => {
                check_not_placeholder(&v, "odds_api_key secret")?;
                v
            }
            None => {
                return Err(ConfigError::MissingKey {
                    vars: vars.join(" or "),
                    path: SECRET_FILE,
                })
            }
        },
    };
    Ok(key)
}

/// Prevent accidental use of sample/placeholder keys
fn check_not_placeholder(key: &str, source: &'static str) -> Result<(), ConfigError> {
    let key_lower = key.trim().to_lowercase();
    if key_lower.contains("change_me") || key_lower.contains("your_") || key_lower.starts_with("sample") {
        return Err(ConfigError::PlaceholderKey(source));
    }
    Ok(())
}

/// Read a Docker secret; absent or empty files count as unset.
fn read_secret_file(file_path: &str) -> Option<String> {
    std::fs::read_to_string(file_path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn historical_prefers_its_own_key() {
        let key = resolve_api_key(
            ApiKind::Historical,
            lookup(&[("HISTORICAL_ODDS_API_KEY", "hist"), ("ODDS_API_KEY", "live")]),
        )
        .unwrap();
        assert_eq!(key, "hist");
    }

    #[test]
    fn historical_falls_back_to_live_key() {
        let key = resolve_api_key(ApiKind::Historical, lookup(&[("ODDS_API_KEY", " live ")])).unwrap();
        assert_eq!(key, "live");
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = resolve_api_key(ApiKind::Live, lookup(&[("ODDS_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyVar("ODDS_API_KEY")));
    }

    #[test]
    fn placeholder_key_is_rejected() {
        for value in ["CHANGE_ME", "your_key_here", "sample-key"] {
            let err = resolve_api_key(ApiKind::Live, lookup(&[("ODDS_API_KEY", value)])).unwrap_err();
            assert!(matches!(err, ConfigError::PlaceholderKey(_)), "{value}");
        }
    }

    #[test]
    fn sports_list_is_trimmed() {
        assert_eq!(
            parse_sports(" icehockey_nhl , ,basketball_nba"),
            vec!["icehockey_nhl".to_string(), "basketball_nba".to_string()]
        );
    }
}
