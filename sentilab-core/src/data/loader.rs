//! Loader/merger: both raw files in, one merged row set out.

use super::align::{align, UnmatchedPolicy};
use super::canonicalize::{index_sentiment, DuplicatePolicy};
use super::error::DataError;
use super::ingest::{ingest_sentiment, ingest_trades};
use super::schema::{SentimentColumns, TradeColumns};
use crate::domain::MergedRecord;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Raw header names for both inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderColumns {
    pub trades: TradeColumns,
    pub sentiment: SentimentColumns,
}

/// Loader settings. Every field has a default matching the raw exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub instrument: String,
    pub timestamp_format: String,
    pub date_format: String,
    /// UTC offset the trade timestamps are recorded in.
    pub source_utc_offset_minutes: i32,
    /// UTC offset in which the calendar date for the join is taken.
    pub alignment_utc_offset_minutes: i32,
    pub unmatched: UnmatchedPolicy,
    pub duplicate_dates: DuplicatePolicy,
    pub columns: LoaderColumns,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            instrument: "BTC".into(),
            timestamp_format: "%d-%m-%Y %H:%M".into(),
            date_format: "%Y-%m-%d".into(),
            source_utc_offset_minutes: 330,
            alignment_utc_offset_minutes: 330,
            unmatched: UnmatchedPolicy::Drop,
            duplicate_dates: DuplicatePolicy::Reject,
            columns: LoaderColumns::default(),
        }
    }
}

impl LoaderConfig {
    /// Check values serde cannot. Returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.instrument.trim().is_empty() {
            return Err("loader.instrument must not be empty".into());
        }
        for (name, minutes) in [
            ("source_utc_offset_minutes", self.source_utc_offset_minutes),
            ("alignment_utc_offset_minutes", self.alignment_utc_offset_minutes),
        ] {
            if minutes.checked_mul(60).and_then(FixedOffset::east_opt).is_none() {
                return Err(format!("loader.{name} = {minutes} is not a valid UTC offset"));
            }
        }
        if self.timestamp_format.trim().is_empty() || self.date_format.trim().is_empty() {
            return Err("loader date/time formats must not be empty".into());
        }
        Ok(())
    }
}

/// Counts from one merge. `merged + excluded == instrument_rows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub instrument: String,
    pub raw_trade_rows: usize,
    pub instrument_rows: usize,
    pub sentiment_rows: usize,
    pub sentiment_days: usize,
    pub superseded_sentiment_rows: usize,
    pub classification_mismatches: usize,
    pub merged_rows: usize,
    pub excluded_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// BLAKE3 digests of the bytes each input was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputHashes {
    pub trades: String,
    pub sentiment: String,
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub records: Vec<MergedRecord>,
    pub report: MergeReport,
    pub inputs: InputHashes,
}

/// Read both files, validate, align and derive. Nothing is written.
pub fn merge_files(
    trades_path: &Path,
    sentiment_path: &Path,
    config: &LoaderConfig,
) -> Result<MergeOutput, DataError> {
    let trades = ingest_trades(trades_path, config)?;
    info!(
        raw = trades.total_rows,
        instrument = %config.instrument,
        selected = trades.records.len(),
        "loaded trade log"
    );

    let sentiment = ingest_sentiment(sentiment_path, config)?;
    let inputs = InputHashes {
        trades: trades.content_hash,
        sentiment: sentiment.content_hash,
    };
    let readings = sentiment.records;
    let sentiment_rows = readings.len();
    let mismatches = readings.iter().filter(|r| r.classification_disagrees()).count();
    if mismatches > 0 {
        warn!(
            rows = mismatches,
            "source classification disagrees with score-derived phase; using derived phase"
        );
    }

    let index = index_sentiment(readings, config.duplicate_dates)?;
    if index.superseded > 0 {
        warn!(
            superseded = index.superseded,
            "duplicate sentiment dates resolved by keeping the last row"
        );
    }
    info!(
        rows = sentiment_rows,
        days = index.len(),
        first = ?index.first_date(),
        last = ?index.last_date(),
        "loaded sentiment index"
    );

    let alignment = align(&trades.records, &index, config.unmatched)?;
    let report = MergeReport {
        instrument: config.instrument.clone(),
        raw_trade_rows: trades.total_rows,
        instrument_rows: trades.records.len(),
        sentiment_rows,
        sentiment_days: index.len(),
        superseded_sentiment_rows: index.superseded,
        classification_mismatches: mismatches,
        merged_rows: alignment.merged.len(),
        excluded_rows: alignment.excluded(),
        first_date: alignment.merged.iter().map(|m| m.date).min(),
        last_date: alignment.merged.iter().map(|m| m.date).max(),
    };
    info!(
        merged = report.merged_rows,
        excluded = report.excluded_rows,
        "aligned trades with sentiment"
    );

    Ok(MergeOutput {
        records: alignment.merged,
        report,
        inputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_raw_exports() {
        let config = LoaderConfig::default();
        assert_eq!(config.instrument, "BTC");
        assert_eq!(config.columns.trades.pnl, "Closed PnL");
        assert_eq!(config.columns.sentiment.score, "value");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: LoaderConfig = toml::from_str(
            r#"
            instrument = "ETH"
            unmatched = "fail"
            [columns.trades]
            pnl = "Realized PnL"
            "#,
        )
        .unwrap();
        assert_eq!(config.instrument, "ETH");
        assert_eq!(config.unmatched, UnmatchedPolicy::Fail);
        assert_eq!(config.columns.trades.pnl, "Realized PnL");
        assert_eq!(config.columns.trades.fee, "Fee");
        assert_eq!(config.duplicate_dates, DuplicatePolicy::Reject);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<LoaderConfig>("instrumnet = \"BTC\"").is_err());
    }

    #[test]
    fn invalid_offset_is_reported() {
        let config = LoaderConfig {
            source_utc_offset_minutes: 24 * 60,
            ..LoaderConfig::default()
        };
        let msg = config.validate().unwrap_err();
        assert!(msg.contains("source_utc_offset_minutes"));
    }
}
