//! Flattening of one bookmaker's markets into fixed CSV columns.

use std::collections::HashMap;

use serde_json::Number;

use crate::odds::{Bookmaker, Market, OddsApiEvent, Outcome};

/// Market values extracted for one (game, bookmaker) pair.
/// `None` is written as an empty CSV field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketLines {
    pub ml_home: Option<Number>,
    pub ml_away: Option<Number>,
    pub spread_home: Option<Number>,
    pub spread_home_odds: Option<Number>,
    pub spread_away: Option<Number>,
    pub spread_away_odds: Option<Number>,
    pub total_line: Option<Number>,
    pub total_over_odds: Option<Number>,
    pub total_under_odds: Option<Number>,
}

/// First market with the given key, if the bookmaker quotes it.
fn find_market<'a>(markets: &'a [Market], key: &str) -> Option<&'a Market> {
    markets.iter().find(|m| m.key == key)
}

/// Outcomes keyed by name. A repeated name overwrites the earlier outcome.
fn outcomes_by_name(market: &Market) -> HashMap<&str, &Outcome> {
    let mut by_name = HashMap::with_capacity(market.outcomes.len());
    for outcome in &market.outcomes {
        by_name.insert(outcome.name.as_str(), outcome);
    }
    by_name
}

/// Extract moneyline, spread and total columns for one bookmaker.
///
/// Never fails: a missing market or outcome leaves its fields empty.
pub fn extract(game: &OddsApiEvent, bookmaker: &Bookmaker) -> MarketLines {
    let home = game.home_team.as_str();
    let away = game.away_team.as_str();
    let mut lines = MarketLines::default();

    if let Some(h2h) = find_market(&bookmaker.markets, "h2h") {
        let outcomes = outcomes_by_name(h2h);
        lines.ml_home = outcomes.get(home).and_then(|o| o.price.clone());
        lines.ml_away = outcomes.get(away).and_then(|o| o.price.clone());
    }

    if let Some(spreads) = find_market(&bookmaker.markets, "spreads") {
        let outcomes = outcomes_by_name(spreads);
        if let Some(o) = outcomes.get(home) {
            lines.spread_home = o.point.clone();
            lines.spread_home_odds = o.price.clone();
        }
        if let Some(o) = outcomes.get(away) {
            lines.spread_away = o.point.clone();
            lines.spread_away_odds = o.price.clone();
        }
    }

    if let Some(totals) = find_market(&bookmaker.markets, "totals") {
        let outcomes = outcomes_by_name(totals);
        // The line comes from Over only; Under contributes its price alone.
        if let Some(over) = outcomes.get("Over") {
            lines.total_line = over.point.clone();
            lines.total_over_odds = over.price.clone();
        }
        if let Some(under) = outcomes.get("Under") {
            lines.total_under_odds = under.price.clone();
        }
    }

    lines
}
