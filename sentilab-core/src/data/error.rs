//! Structured error types for data operations.
//!
//! Three families, all fatal to the stage that raises them:
//! schema problems (columns, join ambiguity), value validation, and file I/O.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    #[error("ambiguous join: {rows} sentiment rows for {date}")]
    AmbiguousJoin { date: NaiveDate, rows: usize },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("non-numeric value in column '{column}' (row {row}): '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("value {value} in column '{column}' (row {row}) outside [{min}, {max}]")]
    OutOfRange {
        column: String,
        row: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("missing value in column '{column}' (row {row})")]
    MissingValue { column: String, row: usize },

    #[error("cannot parse '{value}' in column '{column}' (row {row}) as {expected}")]
    Unparseable {
        column: String,
        row: usize,
        value: String,
        expected: String,
    },

    #[error("{count} trade(s) have no same-day sentiment record")]
    UnmatchedTrades { count: usize },

    #[error("malformed table {file}: {reason}")]
    Malformed { file: String, reason: String },
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_column() {
        let err: DataError = SchemaError::MissingColumn {
            file: "trades.csv".into(),
            column: "Fee".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "schema error: missing required column 'Fee' in trades.csv"
        );

        let err: DataError = ValidationError::NonNumeric {
            column: "value".into(),
            row: 4,
            value: "n/a".into(),
        }
        .into();
        assert!(err.to_string().contains("'value'"));
        assert!(err.to_string().contains("row 4"));
    }

    #[test]
    fn io_error_includes_path() {
        let err = DataError::io(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.csv"));
    }
}
