//! SentiLab Core: domain types and the data layer.
//!
//! - Domain types (trades, sentiment readings, phases, merged rows)
//! - Schema contracts for the raw inputs and the merged table
//! - Raw CSV ingestion via Polars
//! - Same-day alignment with explicit unmatched/duplicate policies
//! - Atomic persistence of the merged table plus a provenance manifest

pub mod data;
pub mod domain;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types handed between stages are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::SentimentRecord>();
        require_sync::<domain::SentimentRecord>();
        require_send::<domain::MergedRecord>();
        require_sync::<domain::MergedRecord>();
        require_send::<data::MergeReport>();
        require_sync::<data::MergeReport>();
        require_send::<data::MergeManifest>();
        require_sync::<data::MergeManifest>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }

    #[test]
    fn phase_order_is_canonical() {
        let mut phases = domain::SentimentPhase::ALL.to_vec();
        phases.reverse();
        phases.sort();
        assert_eq!(phases, domain::SentimentPhase::ALL.to_vec());
    }
}
