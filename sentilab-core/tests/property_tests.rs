//! Property tests for merge invariants.
//!
//! Uses proptest to verify:
//! 1. Phase buckets: every valid score maps to exactly the bucket containing it
//! 2. Net P&L: merged rows carry gross minus fee exactly, win flag agrees
//! 3. Alignment: merged + excluded always equals the trades offered

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use sentilab_core::data::{align, index_sentiment, DuplicatePolicy, UnmatchedPolicy};
use sentilab_core::domain::{MergedRecord, SentimentPhase, SentimentRecord, TradeRecord};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_score() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0.0..=100.0_f64),
        (0u32..=100).prop_map(f64::from),
    ]
}

fn arb_pnl() -> impl Strategy<Value = f64> {
    (-5_000.0..5_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_fee() -> impl Strategy<Value = f64> {
    (0.0..25.0_f64).prop_map(|f| (f * 10_000.0).round() / 10_000.0)
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn trade(row: usize, day: i64, pnl: f64, fee: f64) -> TradeRecord {
    let timestamp = (base_date() + Duration::days(day)).and_hms_opt(12, 0, 0).unwrap();
    TradeRecord {
        row,
        timestamp,
        date: timestamp.date(),
        instrument: "BTC".into(),
        direction: if row % 2 == 0 { "Open Long" } else { "Close Short" }.into(),
        side: "BUY".into(),
        size_tokens: None,
        size_usd: 100.0,
        price: 50_000.0,
        closed_pnl: pnl,
        fee,
    }
}

fn reading(row: usize, day: i64, score: f64) -> SentimentRecord {
    SentimentRecord {
        row,
        date: base_date() + Duration::days(day),
        score,
        phase: SentimentPhase::from_score(score).unwrap(),
        classification: None,
    }
}

// ── 1. Phase buckets ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_lands_in_its_own_bucket(score in arb_score()) {
        let phase = SentimentPhase::from_score(score).unwrap();
        let (lo, hi) = phase.score_range();
        prop_assert!(score >= lo);
        if phase == SentimentPhase::ExtremeGreed {
            prop_assert!(score <= hi);
        } else {
            prop_assert!(score < hi);
        }
    }

    #[test]
    fn out_of_range_scores_have_no_phase(score in prop_oneof![(-1e6..-1e-9_f64), (100.000_001..1e6_f64)]) {
        prop_assert!(SentimentPhase::from_score(score).is_none());
    }
}

// ── 2. Net P&L ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn net_pnl_is_gross_minus_fee(pnl in arb_pnl(), fee in arb_fee(), score in arb_score()) {
        let merged = MergedRecord::join(&trade(0, 0, pnl, fee), &reading(0, 0, score));
        prop_assert_eq!(merged.net_pnl, pnl - fee);
        prop_assert_eq!(merged.is_win, merged.net_pnl > 0.0);
        prop_assert_eq!(merged.is_loss, merged.net_pnl < 0.0);
        prop_assert!(!(merged.is_win && merged.is_loss));
    }
}

// ── 3. Alignment conservation ────────────────────────────────────────

proptest! {
    #[test]
    fn merged_plus_excluded_is_total(
        trade_days in prop::collection::vec(0i64..30, 0..60),
        sentiment_days in prop::collection::btree_set(0i64..30, 0..30),
        score in arb_score(),
    ) {
        let trades: Vec<TradeRecord> = trade_days
            .iter()
            .enumerate()
            .map(|(row, day)| trade(row, *day, 1.0, 0.1))
            .collect();
        let readings = sentiment_days
            .iter()
            .enumerate()
            .map(|(row, day)| reading(row, *day, score))
            .collect();
        let index = index_sentiment(readings, DuplicatePolicy::Reject).unwrap();
        let alignment = align(&trades, &index, UnmatchedPolicy::Drop).unwrap();

        prop_assert_eq!(alignment.merged.len() + alignment.excluded(), trades.len());
        for record in &alignment.merged {
            prop_assert!(sentiment_days.contains(&(record.date - base_date()).num_days()));
        }
        for window in alignment.merged.windows(2) {
            prop_assert!(
                (window[0].timestamp, window[0].source_row) <= (window[1].timestamp, window[1].source_row)
            );
        }
    }
}
