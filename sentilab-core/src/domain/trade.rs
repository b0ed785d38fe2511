//! TradeRecord: one row of the raw trade log, after typing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction used for grouping.
///
/// Derived from the free-text direction column ("Open Long", "Close Short",
/// "Buy", ...). `Other` covers rows that mention neither side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
    Other,
}

impl TradeDirection {
    /// Directions that form the phase × direction grid, in canonical order.
    pub const GROUPED: [TradeDirection; 2] = [TradeDirection::Long, TradeDirection::Short];

    /// `Long` wins over `Short` when both flags are set (e.g. "Long > Short").
    pub fn from_flags(is_long: bool, is_short: bool) -> Self {
        if is_long {
            TradeDirection::Long
        } else if is_short {
            TradeDirection::Short
        } else {
            TradeDirection::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeDirection::Long => "Long",
            TradeDirection::Short => "Short",
            TradeDirection::Other => "Other",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single transaction from the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Position in the raw file (0-based, header excluded).
    pub row: usize,
    /// Execution time in the source timezone.
    pub timestamp: NaiveDateTime,
    /// Calendar date in the alignment timezone.
    pub date: NaiveDate,
    pub instrument: String,
    /// Free-text direction as exported ("Open Long", "Close Short", ...).
    pub direction: String,
    /// BUY / SELL, empty when the column is absent.
    pub side: String,
    pub size_tokens: Option<f64>,
    /// Position size in quote currency.
    pub size_usd: f64,
    pub price: f64,
    /// Realized P&L before fees.
    pub closed_pnl: f64,
    pub fee: f64,
}

impl TradeRecord {
    pub fn net_pnl(&self) -> f64 {
        self.closed_pnl - self.fee
    }

    pub fn is_long(&self) -> bool {
        contains_ignore_case(&self.direction, "long")
    }

    pub fn is_short(&self) -> bool {
        contains_ignore_case(&self.direction, "short")
    }

    pub fn trade_direction(&self) -> TradeDirection {
        TradeDirection::from_flags(self.is_long(), self.is_short())
    }

    /// A fill that closes (part of) a position: the direction says so or it
    /// realized a non-zero P&L.
    pub fn is_closed(&self) -> bool {
        contains_ignore_case(&self.direction, "close") || self.closed_pnl != 0.0
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}
