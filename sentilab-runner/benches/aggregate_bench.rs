//! Criterion benchmarks for the aggregation hot path.
//!
//! Run with: `cargo bench -p sentilab-runner`

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sentilab_core::domain::{MergedRecord, SentimentPhase, SentimentRecord, TradeRecord};
use sentilab_runner::{SentimentSummary, SignificanceReport};

/// Deterministic synthetic merged rows spread over a year.
fn generate_records(count: usize) -> Vec<MergedRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let date = start + Duration::days((i % 365) as i64);
            let score = ((i * 37) % 101) as f64;
            let trade = TradeRecord {
                row: i,
                timestamp: date.and_hms_opt(12, 0, 0).unwrap(),
                date,
                instrument: "BTC".into(),
                direction: if i % 3 == 0 { "Open Short" } else { "Close Long" }.into(),
                side: "BUY".into(),
                size_tokens: None,
                size_usd: 100.0 + (i % 50) as f64 * 20.0,
                price: 60_000.0,
                closed_pnl: ((i * 7919) % 200) as f64 - 100.0,
                fee: 0.5,
            };
            let sentiment = SentimentRecord {
                row: i % 365,
                date,
                score,
                phase: SentimentPhase::from_score(score).unwrap(),
                classification: None,
            };
            MergedRecord::join(&trade, &sentiment)
        })
        .collect()
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentiment_summary");
    for size in [1_000, 10_000, 100_000].iter() {
        let records = generate_records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| SentimentSummary::compute(black_box(&records)));
        });
    }
    group.finish();
}

fn bench_significance(c: &mut Criterion) {
    let mut group = c.benchmark_group("significance_report");
    for size in [1_000, 10_000, 100_000].iter() {
        let records = generate_records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| SignificanceReport::compute(black_box(&records), 0.001));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_summary, bench_significance);
criterion_main!(benches);
