//! HTTP client for The Odds API live and historical odds endpoints.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::{Quota, RateLimiter};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::odds::{HistoricalResponse, OddsApiEvent};

const MARKETS: &str = "h2h,spreads,totals";

/// Spacing between consecutive requests.
pub const REQUEST_SPACING: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Odds API error (status {status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Non-2xx responses, reported separately from other failures.
    pub fn is_http_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}

/// Quota counters and the server `date` header from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub requests_remaining: String,
    pub requests_used: String,
    /// Raw HTTP `date` header, empty when the server sent none.
    pub received_at: String,
}

impl ResponseMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            requests_remaining: header("x-requests-remaining").unwrap_or_else(|| "N/A".to_string()),
            requests_used: header("x-requests-used").unwrap_or_else(|| "N/A".to_string()),
            received_at: header("date").unwrap_or_default(),
        }
    }
}

type DirectLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Odds API client
pub struct OddsApiClient {
    base_url: String,
    api_key: String,
    bookmakers: Option<String>,
    http_client: reqwest::Client,
    rate_limiter: DirectLimiter,
}

impl OddsApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        // One request per spacing interval, no bursts
        let quota = Quota::with_period(REQUEST_SPACING)
            .context("Request spacing must be non-zero")?
            .allow_burst(NonZeroU32::MIN);

        // HTTP client with timeouts
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            bookmakers: config.bookmakers.clone(),
            http_client,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<(T, ResponseMeta), FetchError> {
        // Wait for rate limit
        self.rate_limiter.until_ready().await;

        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let meta = ResponseMeta::from_headers(response.headers());
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body });
        }

        let parsed = serde_json::from_str(&body)?;
        Ok((parsed, meta))
    }

    /// Current odds for a sport
    pub async fn fetch_odds(
        &self,
        sport_key: &str,
    ) -> Result<(Vec<OddsApiEvent>, ResponseMeta), FetchError> {
        let url = format!("{}/sports/{}/odds/", self.base_url, sport_key);

        let mut params = vec![
            ("regions", "us"),
            ("markets", MARKETS),
            ("oddsFormat", "american"),
        ];
        if let Some(bookmakers) = &self.bookmakers {
            params.push(("bookmakers", bookmakers.as_str()));
        }

        let (events, meta): (Vec<OddsApiEvent>, _) = self.get_json(&url, &params).await?;
        info!(
            "API quota - Used: {}, Remaining: {}",
            meta.requests_used, meta.requests_remaining
        );
        Ok((events, meta))
    }

    /// Historical odds snapshot closest to `snapshot_at` (`YYYY-MM-DDTHH:MM:SSZ`)
    pub async fn fetch_historical_odds(
        &self,
        sport_key: &str,
        snapshot_at: &str,
    ) -> Result<(HistoricalResponse, ResponseMeta), FetchError> {
        let url = format!("{}/historical/sports/{}/odds/", self.base_url, sport_key);

        let params = [
            ("regions", "us"),
            ("markets", MARKETS),
            ("oddsFormat", "american"),
            ("date", snapshot_at),
        ];

        self.get_json(&url, &params).await
    }
}
