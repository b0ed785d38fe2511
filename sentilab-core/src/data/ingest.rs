//! Raw CSV ingestion via Polars.
//!
//! Each file is read from disk once; its BLAKE3 digest is taken from those
//! same bytes, which are then parsed into a `DataFrame` with full-file schema
//! inference,
//! checked against a `TableContract`, then converted into typed records.
//! Numeric columns that Polars could not infer as numbers are re-parsed per
//! row so the error can name the offending row and value.

use super::error::{DataError, SchemaError, ValidationError};
use super::loader::LoaderConfig;
use super::schema::TableContract;
use crate::domain::{SentimentPhase, SentimentRecord, TradeRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Fallback timestamp layouts tried after the configured one. All unambiguous.
const ISO_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Trades of the target instrument plus the raw row count.
#[derive(Debug, Clone)]
pub struct TradeLog {
    pub records: Vec<TradeRecord>,
    /// Rows in the file, all instruments.
    pub total_rows: usize,
    /// BLAKE3 of the bytes the log was parsed from.
    pub content_hash: String,
}

/// Sentiment readings in file order, duplicates included.
#[derive(Debug, Clone)]
pub struct SentimentLog {
    pub records: Vec<SentimentRecord>,
    pub content_hash: String,
}

/// A parsed input file and the digest of its bytes.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub frame: DataFrame,
    pub content_hash: String,
}

/// Read a delimited file with a header row.
pub fn read_csv(path: &Path) -> Result<SourceTable, DataError> {
    let bytes = std::fs::read(path).map_err(|e| DataError::io(path, e))?;
    let content_hash = blake3::hash(&bytes).to_hex().to_string();

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ValidationError::Malformed {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    debug!(
        file = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        hash = %content_hash,
        "read csv"
    );
    Ok(SourceTable {
        frame,
        content_hash,
    })
}

/// Column names of a frame, in order.
pub fn headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Load the trade log and keep only rows of `config.instrument`.
pub fn ingest_trades(path: &Path, config: &LoaderConfig) -> Result<TradeLog, DataError> {
    let table = file_label(path);
    let SourceTable {
        frame: df,
        content_hash,
    } = read_csv(path)?;
    let cols = &config.columns.trades;
    let header_names = headers(&df);
    cols.contract(&table).validate(&header_names)?;

    let instrument = text_column(&df, &table, &cols.instrument)?;
    let timestamps = text_column(&df, &table, &cols.timestamp)?;
    let direction = text_column(&df, &table, &cols.direction)?;
    let size = NumberColumn::extract(&df, &table, &cols.size)?;
    let price = NumberColumn::extract(&df, &table, &cols.price)?;
    let pnl = NumberColumn::extract(&df, &table, &cols.pnl)?;
    let fee = NumberColumn::extract(&df, &table, &cols.fee)?;
    let side = if TableContract::has(&header_names, &cols.side) {
        Some(text_column(&df, &table, &cols.side)?)
    } else {
        None
    };
    let size_tokens = if TableContract::has(&header_names, &cols.size_tokens) {
        Some(NumberColumn::extract(&df, &table, &cols.size_tokens)?)
    } else {
        None
    };

    let date_shift = Duration::minutes(i64::from(
        config.alignment_utc_offset_minutes - config.source_utc_offset_minutes,
    ));

    let mut records = Vec::new();
    for row in 0..df.height() {
        let matches = instrument[row]
            .as_deref()
            .map(|coin| coin.trim().eq_ignore_ascii_case(&config.instrument))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let raw_ts = timestamps[row].as_deref().ok_or_else(|| ValidationError::MissingValue {
            column: cols.timestamp.clone(),
            row,
        })?;
        let timestamp = parse_timestamp(raw_ts, &config.timestamp_format).ok_or_else(|| {
            ValidationError::Unparseable {
                column: cols.timestamp.clone(),
                row,
                value: raw_ts.to_string(),
                expected: format!("timestamp '{}'", config.timestamp_format),
            }
        })?;

        let size_tokens = match &size_tokens {
            Some(column) => column.value(&cols.size_tokens, row)?,
            None => None,
        };

        records.push(TradeRecord {
            row,
            timestamp,
            date: (timestamp + date_shift).date(),
            instrument: instrument[row].as_deref().unwrap_or_default().trim().to_string(),
            direction: direction[row].clone().unwrap_or_default(),
            side: side
                .as_ref()
                .and_then(|s| s[row].clone())
                .unwrap_or_default(),
            size_tokens,
            size_usd: size.required(&cols.size, row)?,
            price: price.required(&cols.price, row)?,
            closed_pnl: pnl.required(&cols.pnl, row)?,
            fee: fee.required(&cols.fee, row)?,
        });
    }

    debug!(
        file = %path.display(),
        total = df.height(),
        selected = records.len(),
        instrument = %config.instrument,
        "ingested trades"
    );
    Ok(TradeLog {
        records,
        total_rows: df.height(),
        content_hash,
    })
}

/// Load the sentiment index. Rows are returned in file order, duplicates included.
pub fn ingest_sentiment(path: &Path, config: &LoaderConfig) -> Result<SentimentLog, DataError> {
    let table = file_label(path);
    let SourceTable {
        frame: df,
        content_hash,
    } = read_csv(path)?;
    let cols = &config.columns.sentiment;
    let header_names = headers(&df);
    cols.contract(&table).validate(&header_names)?;

    let dates = text_column(&df, &table, &cols.date)?;
    let scores = NumberColumn::extract(&df, &table, &cols.score)?;
    let classification = if TableContract::has(&header_names, &cols.classification) {
        Some(text_column(&df, &table, &cols.classification)?)
    } else {
        None
    };

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let raw_date = dates[row].as_deref().ok_or_else(|| ValidationError::MissingValue {
            column: cols.date.clone(),
            row,
        })?;
        let date = parse_date(raw_date, &config.date_format).ok_or_else(|| {
            ValidationError::Unparseable {
                column: cols.date.clone(),
                row,
                value: raw_date.to_string(),
                expected: format!("date '{}'", config.date_format),
            }
        })?;

        let score = scores.required(&cols.score, row)?;
        let phase = SentimentPhase::from_score(score).ok_or_else(|| ValidationError::OutOfRange {
            column: cols.score.clone(),
            row,
            value: score,
            min: crate::domain::phase::SCORE_MIN,
            max: crate::domain::phase::SCORE_MAX,
        })?;

        records.push(SentimentRecord {
            row,
            date,
            score,
            phase,
            classification: classification
                .as_ref()
                .and_then(|c| c[row].clone())
                .filter(|s| !s.trim().is_empty()),
        });
    }

    debug!(file = %path.display(), rows = records.len(), "ingested sentiment");
    Ok(SentimentLog {
        records,
        content_hash,
    })
}

/// Parse with the configured format, then the ISO fallbacks.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    std::iter::once(format)
        .chain(ISO_TIMESTAMP_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse a calendar date. A trailing time part ("2024-01-01 00:00:00") is ignored.
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, format).ok().or_else(|| {
        let head = raw.split([' ', 'T']).next()?;
        NaiveDate::parse_from_str(head, format).ok()
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn malformed(table: &str, err: PolarsError) -> DataError {
    ValidationError::Malformed {
        file: table.to_string(),
        reason: err.to_string(),
    }
    .into()
}

fn lookup<'a>(df: &'a DataFrame, table: &str, name: &str) -> Result<&'a Column, DataError> {
    df.column(name).map_err(|_| {
        SchemaError::MissingColumn {
            file: table.to_string(),
            column: name.to_string(),
        }
        .into()
    })
}

fn text_column(df: &DataFrame, table: &str, name: &str) -> Result<Vec<Option<String>>, DataError> {
    let column = lookup(df, table, name)?;
    let as_text = column
        .cast(&DataType::String)
        .map_err(|e| malformed(table, e))?;
    let values = as_text.str().map_err(|e| malformed(table, e))?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// A numeric column as Polars inferred it.
enum NumberColumn {
    Numeric(Vec<Option<f64>>),
    /// Inference fell back to strings; parsed per row on access.
    Text(Vec<Option<String>>),
}

impl NumberColumn {
    fn extract(df: &DataFrame, table: &str, name: &str) -> Result<Self, DataError> {
        let column = lookup(df, table, name)?;
        if column.dtype() == &DataType::String {
            return Ok(NumberColumn::Text(text_column(df, table, name)?));
        }
        let as_float = column
            .cast(&DataType::Float64)
            .map_err(|e| malformed(table, e))?;
        let values = as_float.f64().map_err(|e| malformed(table, e))?;
        Ok(NumberColumn::Numeric(values.into_iter().collect()))
    }

    /// `Ok(None)` for an empty cell.
    fn value(&self, column: &str, row: usize) -> Result<Option<f64>, ValidationError> {
        let parsed = match self {
            NumberColumn::Numeric(values) => values[row],
            NumberColumn::Text(values) => match values[row].as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(raw.parse::<f64>().map_err(|_| ValidationError::NonNumeric {
                    column: column.to_string(),
                    row,
                    value: raw.to_string(),
                })?),
            },
        };
        match parsed {
            Some(v) if !v.is_finite() => Err(ValidationError::NonNumeric {
                column: column.to_string(),
                row,
                value: v.to_string(),
            }),
            other => Ok(other),
        }
    }

    fn required(&self, column: &str, row: usize) -> Result<f64, ValidationError> {
        self.value(column, row)?.ok_or_else(|| ValidationError::MissingValue {
            column: column.to_string(),
            row,
        })
    }
}
