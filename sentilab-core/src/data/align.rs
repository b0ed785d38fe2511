//! Same-day alignment of trades with sentiment readings.
//!
//! Exact calendar-date equality only. A trade on a day with no reading is
//! never matched to a neighbouring day.

use super::canonicalize::{sort_merged, SentimentIndex};
use super::error::ValidationError;
use crate::domain::{MergedRecord, TradeRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// What to do with trades whose date has no sentiment reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Exclude them and log the count.
    #[default]
    Drop,
    /// Fail with `ValidationError::UnmatchedTrades`.
    Fail,
}

#[derive(Debug, Clone)]
pub struct Alignment {
    /// Joined rows in canonical order.
    pub merged: Vec<MergedRecord>,
    /// Source rows of the excluded trades.
    pub excluded_rows: Vec<usize>,
    /// Distinct dates the excluded trades fell on.
    pub excluded_dates: BTreeSet<NaiveDate>,
}

impl Alignment {
    pub fn excluded(&self) -> usize {
        self.excluded_rows.len()
    }
}

pub fn align(
    trades: &[TradeRecord],
    sentiment: &SentimentIndex,
    policy: UnmatchedPolicy,
) -> Result<Alignment, ValidationError> {
    let mut merged = Vec::with_capacity(trades.len());
    let mut excluded_rows = Vec::new();
    let mut excluded_dates = BTreeSet::new();

    for trade in trades {
        match sentiment.get(&trade.date) {
            Some(reading) => merged.push(MergedRecord::join(trade, reading)),
            None => {
                excluded_rows.push(trade.row);
                excluded_dates.insert(trade.date);
            }
        }
    }

    if !excluded_rows.is_empty() {
        if policy == UnmatchedPolicy::Fail {
            return Err(ValidationError::UnmatchedTrades {
                count: excluded_rows.len(),
            });
        }
        warn!(
            excluded = excluded_rows.len(),
            days = excluded_dates.len(),
            first = ?excluded_dates.first(),
            last = ?excluded_dates.last(),
            "trades without same-day sentiment were dropped"
        );
    }

    sort_merged(&mut merged);
    Ok(Alignment {
        merged,
        excluded_rows,
        excluded_dates,
    })
}
