//! Canonical ordering: one sentiment reading per date, merged rows by time.

use super::error::SchemaError;
use crate::domain::{MergedRecord, SentimentRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when the sentiment file has several rows for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `SchemaError::AmbiguousJoin`.
    #[default]
    Reject,
    /// Keep the row that appears last in the file.
    KeepLast,
}

/// Sentiment readings keyed by date, at most one per date.
#[derive(Debug, Clone, Default)]
pub struct SentimentIndex {
    by_date: BTreeMap<NaiveDate, SentimentRecord>,
    /// Rows dropped under `KeepLast`.
    pub superseded: usize,
}

impl SentimentIndex {
    pub fn get(&self, date: &NaiveDate) -> Option<&SentimentRecord> {
        self.by_date.get(date)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next_back().copied()
    }
}

/// Build the date index. Under `Reject`, the earliest duplicated date is reported.
pub fn index_sentiment(
    records: Vec<SentimentRecord>,
    policy: DuplicatePolicy,
) -> Result<SentimentIndex, SchemaError> {
    if policy == DuplicatePolicy::Reject {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for record in &records {
            *counts.entry(record.date).or_default() += 1;
        }
        if let Some((date, rows)) = counts.into_iter().find(|(_, n)| *n > 1) {
            return Err(SchemaError::AmbiguousJoin { date, rows });
        }
    }

    let mut index = SentimentIndex::default();
    for record in records {
        if index.by_date.insert(record.date, record).is_some() {
            index.superseded += 1;
        }
    }
    Ok(index)
}

/// Sort merged rows by timestamp, ties broken by source row.
pub fn sort_merged(records: &mut [MergedRecord]) {
    records.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.source_row.cmp(&b.source_row))
    });
}
