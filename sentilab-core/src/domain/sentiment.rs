//! SentimentRecord: one day of the Fear & Greed index.

use super::phase::SentimentPhase;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// Position in the raw file (0-based, header excluded).
    pub row: usize,
    pub date: NaiveDate,
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Phase derived from `score`; the source file's own label is not trusted.
    pub phase: SentimentPhase,
    /// Classification label as published, if the file carries one.
    pub classification: Option<String>,
}

impl SentimentRecord {
    /// True when the published label disagrees with the derived phase.
    pub fn classification_disagrees(&self) -> bool {
        match &self.classification {
            Some(label) => match label.parse::<SentimentPhase>() {
                Ok(published) => published != self.phase,
                Err(_) => true,
            },
            None => false,
        }
    }
}
