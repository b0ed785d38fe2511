//! MergedRecord: a trade joined to the sentiment reading of its calendar day.
//!
//! Field order here is the column order of the persisted merged table.

use super::phase::SentimentPhase;
use super::sentiment::SentimentRecord;
use super::trade::{TradeDirection, TradeRecord};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub source_row: usize,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub instrument: String,
    pub direction: String,
    pub side: String,
    pub size_tokens: Option<f64>,
    pub size_usd: f64,
    pub price: f64,
    pub closed_pnl: f64,
    pub fee: f64,
    pub closed: bool,
    pub net_pnl: f64,
    pub is_win: bool,
    pub is_loss: bool,
    pub is_long: bool,
    pub is_short: bool,
    pub trade_direction: TradeDirection,
    pub sentiment_score: f64,
    pub sentiment_phase: SentimentPhase,
}

impl MergedRecord {
    /// Join a trade with the sentiment record for the same date.
    ///
    /// The caller is responsible for the date match; this only derives fields.
    pub fn join(trade: &TradeRecord, sentiment: &SentimentRecord) -> Self {
        debug_assert_eq!(trade.date, sentiment.date);
        let net_pnl = trade.net_pnl();
        let is_long = trade.is_long();
        let is_short = trade.is_short();
        Self {
            source_row: trade.row,
            timestamp: trade.timestamp,
            date: trade.date,
            instrument: trade.instrument.clone(),
            direction: trade.direction.clone(),
            side: trade.side.to_ascii_uppercase(),
            size_tokens: trade.size_tokens,
            size_usd: trade.size_usd,
            price: trade.price,
            closed_pnl: trade.closed_pnl,
            fee: trade.fee,
            closed: trade.is_closed(),
            net_pnl,
            is_win: net_pnl > 0.0,
            is_loss: net_pnl < 0.0,
            is_long,
            is_short,
            trade_direction: TradeDirection::from_flags(is_long, is_short),
            sentiment_score: sentiment.score,
            sentiment_phase: sentiment.phase,
        }
    }
}
