//! Fixture builders shared by the unit tests.

use chrono::{Duration, NaiveDate};
use sentilab_core::domain::{MergedRecord, SentimentPhase, SentimentRecord, TradeRecord};

/// A merged row on 2024-01-`day`, no fee, so `closed_pnl == net_pnl`.
pub(crate) fn merged(
    row: usize,
    day: u32,
    score: f64,
    net_pnl: f64,
    direction: &str,
    size: f64,
) -> MergedRecord {
    let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    let timestamp = date.and_hms_opt(10, 0, 0).unwrap() + Duration::minutes(row as i64);
    let trade = TradeRecord {
        row,
        timestamp,
        date,
        instrument: "BTC".into(),
        direction: direction.into(),
        side: "BUY".into(),
        size_tokens: None,
        size_usd: size,
        price: 40_000.0,
        closed_pnl: net_pnl,
        fee: 0.0,
    };
    let sentiment = SentimentRecord {
        row: 0,
        date,
        score,
        phase: SentimentPhase::from_score(score).unwrap(),
        classification: None,
    };
    MergedRecord::join(&trade, &sentiment)
}
