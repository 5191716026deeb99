//! The Odds API response types.

use serde::Deserialize;
use serde_json::Number;

/// The Odds API event structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OddsApiEvent {
    pub id: String,
    pub sport_key: String,
    pub sport_title: String,
    /// Carried verbatim into the CSV, never reformatted.
    pub commence_time: String,
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
    pub last_update: String,
    pub markets: Vec<Market>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Market {
    pub key: String,
    pub outcomes: Vec<Outcome>,
}

/// Prices and points keep the upstream number literal so `-110` stays
/// `-110` and `6.0` stays `6.0` in the output.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Outcome {
    pub name: String,
    pub price: Option<Number>,
    pub point: Option<Number>,
}

/// Envelope returned by the historical odds endpoint
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HistoricalResponse {
    pub timestamp: String,
    pub previous_timestamp: Option<String>,
    pub next_timestamp: Option<String>,
    pub data: Vec<OddsApiEvent>,
}

impl OddsApiEvent {
    /// Short sport label used in the `sport` column.
    pub fn sport_label(&self) -> String {
        sport_label(&self.sport_key)
    }
}

pub fn sport_label(sport_key: &str) -> String {
    if sport_key.contains("nhl") {
        "NHL".to_string()
    } else {
        sport_key.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_event_with_missing_fields() {
        let raw = r#"{"id":"abc","home_team":"Boston Bruins","away_team":"Toronto Maple Leafs"}"#;
        let event: OddsApiEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id, "abc");
        assert!(event.bookmakers.is_empty());
        assert_eq!(event.commence_time, "");
    }

    #[test]
    fn outcome_numbers_keep_their_literal_form() {
        let raw = r#"{"name":"Over","price":-110,"point":6.0}"#;
        let outcome: Outcome = serde_json::from_str(raw).unwrap();
        assert_eq!(outcome.price.unwrap().to_string(), "-110");
        assert_eq!(outcome.point.unwrap().to_string(), "6.0");
    }

    #[test]
    fn historical_envelope_parses() {
        let raw = r#"{
            "timestamp": "2024-01-05T16:55:00Z",
            "previous_timestamp": "2024-01-05T16:50:00Z",
            "next_timestamp": null,
            "data": [{"id":"g1","sport_key":"icehockey_nhl","home_team":"A","away_team":"B","bookmakers":[]}]
        }"#;
        let resp: HistoricalResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.timestamp, "2024-01-05T16:55:00Z");
        assert_eq!(resp.data.len(), 1);
        assert!(resp.next_timestamp.is_none());
    }

    #[test]
    fn sport_label_maps_nhl() {
        assert_eq!(sport_label("icehockey_nhl"), "NHL");
        assert_eq!(sport_label("basketball_nba"), "BASKETBALL_NBA");
    }
}
