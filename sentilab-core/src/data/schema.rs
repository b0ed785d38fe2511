//! Schema contracts for the two raw inputs and the merged table.
//!
//! Raw column names are configurable (exports differ in header spelling);
//! the merged table's columns are fixed and owned by this crate.

use super::error::SchemaError;
use serde::{Deserialize, Serialize};

/// Logical type of a column. Checked when values are extracted, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Number,
    Timestamp,
    Date,
    Flag,
}

/// One column in a table contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ColumnSpec {
    fn required(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    fn optional(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

/// Expected columns of a delimited file.
#[derive(Debug, Clone)]
pub struct TableContract {
    /// Label used in error messages ("trade log", a file name, ...).
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableContract {
    /// Fail with `MissingColumn` for the first required column absent from `headers`.
    pub fn validate<S: AsRef<str>>(&self, headers: &[S]) -> Result<(), SchemaError> {
        for spec in self.columns.iter().filter(|c| c.required) {
            if !headers.iter().any(|h| h.as_ref() == spec.name) {
                return Err(SchemaError::MissingColumn {
                    file: self.table.clone(),
                    column: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether an optional column is present in `headers`.
    pub fn has<S: AsRef<str>>(headers: &[S], name: &str) -> bool {
        headers.iter().any(|h| h.as_ref() == name)
    }
}

/// Header names of the raw trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TradeColumns {
    pub timestamp: String,
    pub instrument: String,
    pub direction: String,
    pub size: String,
    pub price: String,
    pub pnl: String,
    pub fee: String,
    pub side: String,
    pub size_tokens: String,
}

impl Default for TradeColumns {
    fn default() -> Self {
        Self {
            timestamp: "Timestamp IST".into(),
            instrument: "Coin".into(),
            direction: "Direction".into(),
            size: "Size USD".into(),
            price: "Execution Price".into(),
            pnl: "Closed PnL".into(),
            fee: "Fee".into(),
            side: "Side".into(),
            size_tokens: "Size Tokens".into(),
        }
    }
}

impl TradeColumns {
    pub fn contract(&self, table: &str) -> TableContract {
        TableContract {
            table: table.to_string(),
            columns: vec![
                ColumnSpec::required(&self.timestamp, ColumnKind::Timestamp),
                ColumnSpec::required(&self.instrument, ColumnKind::Text),
                ColumnSpec::required(&self.direction, ColumnKind::Text),
                ColumnSpec::required(&self.size, ColumnKind::Number),
                ColumnSpec::required(&self.price, ColumnKind::Number),
                ColumnSpec::required(&self.pnl, ColumnKind::Number),
                ColumnSpec::required(&self.fee, ColumnKind::Number),
                ColumnSpec::optional(&self.side, ColumnKind::Text),
                ColumnSpec::optional(&self.size_tokens, ColumnKind::Number),
            ],
        }
    }
}

/// Header names of the raw sentiment index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentimentColumns {
    pub date: String,
    pub score: String,
    pub classification: String,
}

impl Default for SentimentColumns {
    fn default() -> Self {
        Self {
            date: "date".into(),
            score: "value".into(),
            classification: "classification".into(),
        }
    }
}

impl SentimentColumns {
    pub fn contract(&self, table: &str) -> TableContract {
        TableContract {
            table: table.to_string(),
            columns: vec![
                ColumnSpec::required(&self.date, ColumnKind::Date),
                ColumnSpec::required(&self.score, ColumnKind::Number),
                ColumnSpec::optional(&self.classification, ColumnKind::Text),
            ],
        }
    }
}

/// Columns of the persisted merged table, in file order.
///
/// Must stay in sync with the field order of `MergedRecord`.
pub const MERGED_COLUMNS: &[(&str, ColumnKind)] = &[
    ("source_row", ColumnKind::Number),
    ("timestamp", ColumnKind::Timestamp),
    ("date", ColumnKind::Date),
    ("instrument", ColumnKind::Text),
    ("direction", ColumnKind::Text),
    ("side", ColumnKind::Text),
    ("size_tokens", ColumnKind::Number),
    ("size_usd", ColumnKind::Number),
    ("price", ColumnKind::Number),
    ("closed_pnl", ColumnKind::Number),
    ("fee", ColumnKind::Number),
    ("closed", ColumnKind::Flag),
    ("net_pnl", ColumnKind::Number),
    ("is_win", ColumnKind::Flag),
    ("is_loss", ColumnKind::Flag),
    ("is_long", ColumnKind::Flag),
    ("is_short", ColumnKind::Flag),
    ("trade_direction", ColumnKind::Text),
    ("sentiment_score", ColumnKind::Number),
    ("sentiment_phase", ColumnKind::Text),
];

pub fn merged_contract(table: &str) -> TableContract {
    TableContract {
        table: table.to_string(),
        columns: MERGED_COLUMNS
            .iter()
            .map(|(name, kind)| ColumnSpec::required(name, *kind))
            .collect(),
    }
}
