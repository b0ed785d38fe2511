//! Insights report file and its stdout echo.

use crate::aggregate::SentimentSummary;
use crate::insights::{pct, significance_lines, thousands, usd, Insight};
use crate::significance::SignificanceReport;
use sentilab_core::data::{write_atomic, DataError};
use std::fmt::Write;
use std::path::Path;

pub const REPORT_TITLE: &str = "SENTIMENT TRADER ANALYSIS - INSIGHTS REPORT";

/// Full report text: title, totals, numbered insights, test lines.
pub fn render_report(
    instrument: Option<&str>,
    summary: &SentimentSummary,
    tests: &SignificanceReport,
    insights: &[Insight],
) -> String {
    let o = &summary.overall;
    let mut out = String::new();
    match instrument {
        Some(symbol) => {
            let _ = writeln!(out, "{} {}", symbol.to_uppercase(), REPORT_TITLE);
        }
        None => {
            let _ = writeln!(out, "{REPORT_TITLE}");
        }
    }
    let _ = writeln!(out, "{}\n", "=".repeat(60));

    let _ = writeln!(out, "Total Trades: {}", thousands(o.total_trades as u64));
    let _ = writeln!(out, "Total Net P&L: {}", usd(o.total_pnl));
    let _ = writeln!(out, "Overall Win Rate: {}\n", pct(o.win_rate));

    let _ = writeln!(out, "KEY INSIGHTS:");
    let _ = writeln!(out, "{}", "-".repeat(60));
    for (i, insight) in insights.iter().enumerate() {
        let _ = writeln!(out, "{}. [{}] {}", i + 1, insight.category.label(), insight.text);
    }

    let _ = writeln!(out, "\nSTATISTICAL TESTS (significant at p < {}):", tests.alpha);
    let _ = writeln!(out, "{}", "-".repeat(60));
    for line in significance_lines(tests) {
        let _ = writeln!(out, "{line}");
    }
    out
}

pub fn write_report(path: &Path, text: &str) -> Result<(), DataError> {
    write_atomic(path, text.as_bytes())
}

/// The first `n` insights, numbered, for stdout.
pub fn top_insights(insights: &[Insight], n: usize) -> String {
    let mut out = format!("KEY INSIGHTS ({} total):\n", insights.len());
    for (i, insight) in insights.iter().take(n).enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, insight.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InsightsConfig;
    use crate::insights::generate;
    use crate::test_support::merged;

    fn fixture() -> (SentimentSummary, SignificanceReport, Vec<Insight>) {
        let records = vec![
            merged(0, 1, 15.0, 10.0, "Open Long", 100.0),
            merged(1, 1, 15.0, -5.0, "Close Long", 200.0),
            merged(2, 2, 65.0, 20.0, "Open Short", 300.0),
        ];
        let summary = SentimentSummary::compute(&records);
        let tests = SignificanceReport::compute(&records, 0.001);
        let insights = generate(&summary, &tests, &InsightsConfig::default());
        (summary, tests, insights)
    }

    #[test]
    fn report_carries_totals_insights_and_tests() {
        let (summary, tests, insights) = fixture();
        let text = render_report(Some("btc"), &summary, &tests, &insights);
        assert!(text.starts_with("BTC SENTIMENT TRADER ANALYSIS"));
        assert!(text.contains("Total Trades: 3\n"));
        assert!(text.contains("Total Net P&L: $25.00\n"));
        assert!(text.contains("Overall Win Rate: 66.7%\n"));
        assert!(text.contains("1. [optimal] Highest win rate"));
        assert!(text.contains(&format!("{}. [stats]", insights.len())));
        assert!(text.contains("STATISTICAL TESTS"));
    }

    #[test]
    fn total_trades_are_grouped() {
        let (mut summary, tests, insights) = fixture();
        summary.overall.total_trades = 211_224;
        let text = render_report(None, &summary, &tests, &insights);
        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Total Trades: 211,224\n"));
    }

    #[test]
    fn top_insights_truncates() {
        let (_, _, insights) = fixture();
        let text = top_insights(&insights, 2);
        assert!(text.contains(&format!("({} total)", insights.len())));
        assert!(text.contains("  2. "));
        assert!(!text.contains("  3. "));
    }

    #[test]
    fn write_report_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.txt");
        write_report(&path, "first").unwrap();
        write_report(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("nested/report.txt.tmp").exists());
    }
}
