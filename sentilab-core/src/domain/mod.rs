//! Domain types: trades, sentiment readings, phases, merged rows.

pub mod merged;
pub mod phase;
pub mod sentiment;
pub mod trade;

pub use merged::MergedRecord;
pub use phase::SentimentPhase;
pub use sentiment::SentimentRecord;
pub use trade::{TradeDirection, TradeRecord};
