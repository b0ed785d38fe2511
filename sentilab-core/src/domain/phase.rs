//! Sentiment phases: the five Fear & Greed buckets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest valid sentiment score.
pub const SCORE_MIN: f64 = 0.0;
/// Highest valid sentiment score (inclusive).
pub const SCORE_MAX: f64 = 100.0;

/// Categorical sentiment phase derived from a 0–100 score.
///
/// Buckets are half-open `[lo, hi)` except the top one, which is closed:
/// `[0,20)` Extreme Fear, `[20,40)` Fear, `[40,60)` Neutral, `[60,80)` Greed,
/// `[80,100]` Extreme Greed.
///
/// The derived `Ord` follows declaration order, which is the canonical
/// reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentPhase {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    #[serde(rename = "Fear")]
    Fear,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Greed")]
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
}

impl SentimentPhase {
    /// All phases in canonical order.
    pub const ALL: [SentimentPhase; 5] = [
        SentimentPhase::ExtremeFear,
        SentimentPhase::Fear,
        SentimentPhase::Neutral,
        SentimentPhase::Greed,
        SentimentPhase::ExtremeGreed,
    ];

    /// Classify a score. Returns `None` for NaN or scores outside `[0, 100]`.
    pub fn from_score(score: f64) -> Option<Self> {
        if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
            return None;
        }
        let phase = if score < 20.0 {
            SentimentPhase::ExtremeFear
        } else if score < 40.0 {
            SentimentPhase::Fear
        } else if score < 60.0 {
            SentimentPhase::Neutral
        } else if score < 80.0 {
            SentimentPhase::Greed
        } else {
            SentimentPhase::ExtremeGreed
        };
        Some(phase)
    }

    /// Position in canonical order (0..5).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label, as written to the merged table.
    pub fn label(self) -> &'static str {
        match self {
            SentimentPhase::ExtremeFear => "Extreme Fear",
            SentimentPhase::Fear => "Fear",
            SentimentPhase::Neutral => "Neutral",
            SentimentPhase::Greed => "Greed",
            SentimentPhase::ExtremeGreed => "Extreme Greed",
        }
    }

    /// Score range covered by this phase, `(low, high)`.
    pub fn score_range(self) -> (f64, f64) {
        match self {
            SentimentPhase::ExtremeFear => (0.0, 20.0),
            SentimentPhase::Fear => (20.0, 40.0),
            SentimentPhase::Neutral => (40.0, 60.0),
            SentimentPhase::Greed => (60.0, 80.0),
            SentimentPhase::ExtremeGreed => (80.0, 100.0),
        }
    }
}

impl fmt::Display for SentimentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SentimentPhase {
    type Err = String;

    /// Accepts the labels case-insensitively, with or without the space
    /// ("Extreme Fear", "extreme_fear", "ExtremeFear").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "extremefear" => Ok(SentimentPhase::ExtremeFear),
            "fear" => Ok(SentimentPhase::Fear),
            "neutral" => Ok(SentimentPhase::Neutral),
            "greed" => Ok(SentimentPhase::Greed),
            "extremegreed" => Ok(SentimentPhase::ExtremeGreed),
            _ => Err(format!("unknown sentiment phase '{s}'")),
        }
    }
}
