//! Fixed-width tables printed by the merge and aggregate stages.

use crate::aggregate::SentimentSummary;
use crate::insights::{pct, significance_lines, usd};
use crate::significance::SignificanceReport;
use sentilab_core::data::{MergeManifest, MergeReport};
use sentilab_core::domain::SentimentPhase;
use std::fmt::Write;
use std::path::Path;

const RULE_WIDTH: usize = 100;
const RANKED_ROWS: usize = 3;

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat(ch).take(RULE_WIDTH));
    out.push('\n');
}

fn heading(out: &mut String, title: &str) {
    rule(out, '=');
    out.push_str(title);
    out.push('\n');
    rule(out, '=');
}

fn date_range(first: Option<chrono::NaiveDate>, last: Option<chrono::NaiveDate>) -> String {
    match (first, last) {
        (Some(a), Some(b)) => format!("{a} to {b}"),
        _ => "n/a".to_string(),
    }
}

/// Counts and output location of a merge.
pub fn merge_summary(report: &MergeReport, manifest: &MergeManifest, merged_path: &Path) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("MERGE: {}", report.instrument));
    let _ = writeln!(out, "Trade rows (raw):        {}", report.raw_trade_rows);
    let _ = writeln!(out, "{:<25}{}", format!("Trade rows ({}):", report.instrument), report.instrument_rows);
    let _ = writeln!(out, "Sentiment rows:          {}", report.sentiment_rows);
    let _ = writeln!(out, "Sentiment days:          {}", report.sentiment_days);
    if report.superseded_sentiment_rows > 0 {
        let _ = writeln!(out, "Superseded duplicates:   {}", report.superseded_sentiment_rows);
    }
    if report.classification_mismatches > 0 {
        let _ = writeln!(out, "Label mismatches:        {}", report.classification_mismatches);
    }
    let _ = writeln!(out, "Merged rows:             {}", report.merged_rows);
    let _ = writeln!(out, "Excluded (unmatched):    {}", report.excluded_rows);
    let _ = writeln!(out, "Date range:              {}", date_range(report.first_date, report.last_date));
    let _ = writeln!(out, "Output:                  {}", merged_path.display());
    let _ = writeln!(out, "Merged hash:             {}", manifest.merged_hash);
    out
}

/// Per-phase table, phase × direction table and overall block.
pub fn aggregate_summary(summary: &SentimentSummary) -> String {
    let mut out = String::new();

    heading(&mut out, "PERFORMANCE BY SENTIMENT PHASE");
    let _ = writeln!(
        out,
        "{:<14} {:>7} {:>7} {:>14} {:>11} {:>11} {:>11} {:>12} {:>9} {:>6} {:>6}",
        "Phase", "Trades", "Win%", "Total P&L", "Mean", "Median", "Avg loss", "Mean size", "Per day", "Long", "Short"
    );
    rule(&mut out, '-');
    for p in &summary.phases {
        let s = &p.stats;
        let _ = writeln!(
            out,
            "{:<14} {:>7} {:>7} {:>14} {:>11} {:>11} {:>11} {:>12} {:>9.2} {:>6} {:>6}",
            p.phase.label(),
            s.count,
            pct(s.win_rate),
            usd(s.total_pnl),
            usd(s.mean_pnl),
            usd(s.median_pnl),
            usd(s.avg_loss_pnl),
            usd(s.size.mean),
            s.trades_per_day,
            p.long_count,
            p.short_count,
        );
    }

    out.push('\n');
    heading(&mut out, "NET P&L PERCENTILES");
    let _ = writeln!(
        out,
        "{:<14} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Phase", "P5", "P25", "P50", "P75", "P95"
    );
    rule(&mut out, '-');
    for p in &summary.phases {
        let q = &p.stats.pnl_percentiles;
        let _ = writeln!(
            out,
            "{:<14} {:>12} {:>12} {:>12} {:>12} {:>12}",
            p.phase.label(),
            usd(q.p5),
            usd(q.p25),
            usd(q.p50),
            usd(q.p75),
            usd(q.p95),
        );
    }

    out.push('\n');
    heading(&mut out, "TRADE FREQUENCY (trades per observed day)");
    let _ = writeln!(
        out,
        "{:<14} {:>6} {:>9} {:>8} {:>8} {:>8} {:>8}",
        "Phase", "Days", "Mean", "Median", "Std", "Min", "Max"
    );
    rule(&mut out, '-');
    for p in &summary.phases {
        let d = &p.daily;
        let _ = writeln!(
            out,
            "{:<14} {:>6} {:>9.2} {:>8.2} {:>8.2} {:>8.0} {:>8.0}",
            p.phase.label(),
            d.observed_days,
            p.stats.trades_per_day,
            d.median,
            d.std,
            d.min,
            d.max,
        );
    }

    out.push('\n');
    heading(&mut out, "BEST CONDITIONS (ranked by win rate)");
    ranked_rows(&mut out, summary, summary.best(RANKED_ROWS));
    out.push('\n');
    heading(&mut out, "WORST CONDITIONS (ranked by win rate)");
    ranked_rows(&mut out, summary, summary.worst(RANKED_ROWS));

    out.push('\n');
    heading(&mut out, "PHASE x DIRECTION");
    let _ = writeln!(
        out,
        "{:<14} {:<6} {:>7} {:>7} {:>14} {:>11} {:>12}",
        "Phase", "Side", "Trades", "Win%", "Total P&L", "Mean", "Mean size"
    );
    rule(&mut out, '-');
    for cell in &summary.grid {
        let s = &cell.stats;
        let _ = writeln!(
            out,
            "{:<14} {:<6} {:>7} {:>7} {:>14} {:>11} {:>12}",
            cell.phase.label(),
            cell.direction.label(),
            s.count,
            pct(s.win_rate),
            usd(s.total_pnl),
            usd(s.mean_pnl),
            usd(s.size.mean),
        );
    }

    let o = &summary.overall;
    out.push('\n');
    heading(&mut out, "OVERALL");
    let _ = writeln!(out, "Total trades:   {}", o.total_trades);
    let _ = writeln!(out, "Wins / losses:  {} / {}", o.wins, o.losses);
    let _ = writeln!(out, "Win rate:       {}", pct(o.win_rate));
    let _ = writeln!(out, "Total net P&L:  {}", usd(o.total_pnl));
    let _ = writeln!(out, "Trading days:   {}", o.trading_days);
    let _ = writeln!(out, "Date range:     {}", date_range(o.first_date, o.last_date));
    let _ = writeln!(out, "Long / short:   {} / {}", o.long_count, o.short_count);
    out
}

fn ranked_rows(out: &mut String, summary: &SentimentSummary, phases: &[SentimentPhase]) {
    let _ = writeln!(
        out,
        "{:<14} {:>7} {:>14} {:>11} {:>7}",
        "Phase", "Win%", "Total P&L", "Mean", "Trades"
    );
    rule(out, '-');
    if phases.is_empty() {
        let _ = writeln!(out, "(no trades)");
    }
    for phase in phases {
        let s = &summary.phase(*phase).stats;
        let _ = writeln!(
            out,
            "{:<14} {:>7} {:>14} {:>11} {:>7}",
            phase.label(),
            pct(s.win_rate),
            usd(s.total_pnl),
            usd(s.mean_pnl),
            s.count,
        );
    }
}

pub fn significance_block(tests: &SignificanceReport) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("STATISTICAL TESTS (alpha = {})", tests.alpha));
    for line in significance_lines(tests) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::merged;

    #[test]
    fn aggregate_summary_lists_every_phase() {
        let records = vec![
            merged(0, 1, 15.0, 10.0, "Open Long", 100.0),
            merged(1, 1, 15.0, -5.0, "Close Long", 200.0),
            merged(2, 2, 65.0, 20.0, "Open Short", 300.0),
        ];
        let text = aggregate_summary(&SentimentSummary::compute(&records));
        for label in ["Extreme Fear", "Fear", "Neutral", "Greed", "Extreme Greed"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("Total net P&L:  $25.00"));
        assert!(text.contains("Win rate:       66.7%"));
        assert!(text.contains("2024-01-01 to 2024-01-02"));
        assert!(text.contains("TRADE FREQUENCY"));
    }

    #[test]
    fn best_and_worst_sections_follow_ranking() {
        let records = vec![
            merged(0, 1, 10.0, -1.0, "Open Long", 100.0),
            merged(1, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(2, 3, 50.0, 1.0, "Open Long", 100.0),
            merged(3, 3, 50.0, -1.0, "Open Long", 100.0),
            merged(4, 4, 90.0, 2.0, "Open Long", 100.0),
        ];
        let text = aggregate_summary(&SentimentSummary::compute(&records));

        let section_rows = |title: &str| -> Vec<String> {
            let body = text.split(title).nth(1).unwrap();
            body.lines()
                .skip_while(|l| !l.starts_with('-'))
                .skip(1)
                .take_while(|l| !l.is_empty())
                .map(|l| l[..14].trim_end().to_string())
                .collect()
        };
        assert_eq!(section_rows("BEST CONDITIONS"), ["Fear", "Extreme Greed", "Neutral"]);
        assert_eq!(section_rows("WORST CONDITIONS"), ["Extreme Greed", "Neutral", "Extreme Fear"]);
    }

    #[test]
    fn empty_ranking_prints_placeholder() {
        let text = aggregate_summary(&SentimentSummary::compute(&[]));
        assert_eq!(text.matches("(no trades)").count(), 2);
    }

    #[test]
    fn significance_block_has_three_lines() {
        let tests = SignificanceReport::compute(&[], 0.001);
        let text = significance_block(&tests);
        assert_eq!(text.matches("insufficient data").count(), 3);
    }
}
