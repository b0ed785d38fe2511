//! Rule-based insights over the aggregated summary.
//!
//! The rule table runs in a fixed order (optimal conditions, risk patterns,
//! behavioural biases, trading rules, statistical findings) and only
//! considers phases with at least one trade. Ties resolve to the earlier
//! phase in canonical order.

use crate::aggregate::{PhaseStats, SentimentSummary};
use crate::config::InsightsConfig;
use crate::significance::SignificanceReport;
use sentilab_core::domain::{SentimentPhase, TradeDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightCategory {
    OptimalConditions,
    RiskPattern,
    BehavioralBias,
    TradingRule,
    StatisticalFinding,
}

impl InsightCategory {
    pub fn label(self) -> &'static str {
        match self {
            InsightCategory::OptimalConditions => "optimal",
            InsightCategory::RiskPattern => "risk",
            InsightCategory::BehavioralBias => "bias",
            InsightCategory::TradingRule => "rule",
            InsightCategory::StatisticalFinding => "stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub text: String,
}

impl Insight {
    fn new(category: InsightCategory, text: String) -> Self {
        Self { category, text }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Apply the full rule table.
pub fn generate(
    summary: &SentimentSummary,
    tests: &SignificanceReport,
    config: &InsightsConfig,
) -> Vec<Insight> {
    let active: Vec<&PhaseStats> = summary.active_phases().collect();
    let mut out = Vec::new();
    optimal_conditions(&active, &mut out);
    risk_patterns(summary, &active, &mut out);
    behavioral_biases(&active, config, &mut out);
    trading_rules(summary, &active, config, &mut out);
    statistical_findings(tests, &mut out);
    out
}

/// First phase maximising `key`. Strict comparison keeps the earliest on ties.
fn argmax<'a>(phases: &[&'a PhaseStats], key: impl Fn(&PhaseStats) -> f64) -> Option<&'a PhaseStats> {
    let mut best: Option<&PhaseStats> = None;
    for p in phases {
        if best.map_or(true, |b| key(p) > key(b)) {
            best = Some(p);
        }
    }
    best
}

fn argmin<'a>(phases: &[&'a PhaseStats], key: impl Fn(&PhaseStats) -> f64) -> Option<&'a PhaseStats> {
    argmax(phases, |p| -key(p))
}

fn optimal_conditions(active: &[&PhaseStats], out: &mut Vec<Insight>) {
    use InsightCategory::OptimalConditions as C;

    if let Some(p) = argmax(active, |p| p.stats.win_rate) {
        out.push(Insight::new(
            C,
            format!(
                "Highest win rate: {} during {}; increase trading in {}",
                pct(p.stats.win_rate),
                p.phase,
                p.phase
            ),
        ));
    }
    if let Some(p) = argmax(active, |p| p.stats.total_pnl) {
        out.push(Insight::new(
            C,
            format!("Most profitable: {} total net P&L during {}", usd(p.stats.total_pnl), p.phase),
        ));
    }
    if let Some(p) = argmax(active, |p| p.stats.mean_pnl) {
        out.push(Insight::new(
            C,
            format!("Best average: {} per trade during {}", usd(p.stats.mean_pnl), p.phase),
        ));
    }
}

fn risk_patterns(summary: &SentimentSummary, active: &[&PhaseStats], out: &mut Vec<Insight>) {
    use InsightCategory::RiskPattern as C;

    for phase in [SentimentPhase::ExtremeFear, SentimentPhase::ExtremeGreed] {
        let p = summary.phase(phase);
        if p.stats.is_empty() {
            continue;
        }
        let loss = if p.stats.losses == 0 {
            "no losing trades".to_string()
        } else {
            format!("average loss {}", usd(p.stats.avg_loss_pnl))
        };
        out.push(Insight::new(
            C,
            format!("{}: {} win rate, {}", phase, pct(p.stats.win_rate), loss),
        ));
    }

    if let Some(p) = argmax(active, |p| p.stats.size.std) {
        out.push(Insight::new(
            C,
            format!(
                "Highest position size volatility during {} ({} std)",
                p.phase,
                usd(p.stats.size.std)
            ),
        ));
    }
}

fn behavioral_biases(active: &[&PhaseStats], config: &InsightsConfig, out: &mut Vec<Insight>) {
    use InsightCategory::BehavioralBias as C;

    if let (Some(hi), Some(lo)) = (
        argmax(active, |p| p.stats.size.mean),
        argmin(active, |p| p.stats.size.mean),
    ) {
        if lo.stats.size.mean > 0.0 && hi.phase != lo.phase {
            out.push(Insight::new(
                C,
                format!(
                    "Position sizing bias: {:.1}x larger positions during {} vs {}",
                    hi.stats.size.mean / lo.stats.size.mean,
                    hi.phase,
                    lo.phase
                ),
            ));
        }
    }

    for p in active {
        if p.long_count + p.short_count == 0 {
            continue;
        }
        if p.long_ratio > config.long_bias {
            out.push(Insight::new(
                C,
                format!("Long bias: {} long trades during {}", pct0(p.long_ratio), p.phase),
            ));
        } else if p.long_ratio < config.short_bias {
            out.push(Insight::new(
                C,
                format!("Short bias: {} short trades during {}", pct0(p.short_ratio), p.phase),
            ));
        }
    }

    if let (Some(busiest), Some(quietest)) = (
        argmax(active, |p| p.stats.count as f64),
        argmin(active, |p| p.stats.count as f64),
    ) {
        let ratio = busiest.stats.count as f64 / quietest.stats.count as f64;
        if ratio > config.overtrading_ratio {
            out.push(Insight::new(
                C,
                format!(
                    "Overtrading alert: {} trades during {} vs {} during {}",
                    busiest.stats.count, busiest.phase, quietest.stats.count, quietest.phase
                ),
            ));
        }
    }
}

fn trading_rules(
    summary: &SentimentSummary,
    active: &[&PhaseStats],
    config: &InsightsConfig,
    out: &mut Vec<Insight>,
) {
    use InsightCategory::TradingRule as C;

    let names = |pred: &dyn Fn(&PhaseStats) -> bool| -> Vec<&'static str> {
        active.iter().filter(|p| pred(p)).map(|p| p.phase.label()).collect()
    };

    let high = names(&|p| p.stats.win_rate > config.high_win_rate);
    if !high.is_empty() {
        out.push(Insight::new(
            C,
            format!(
                "Rule 1: increase position size during {} (win rate > {})",
                high.join(", "),
                pct0(config.high_win_rate)
            ),
        ));
    }

    let low = names(&|p| p.stats.win_rate < config.low_win_rate);
    if !low.is_empty() {
        out.push(Insight::new(
            C,
            format!(
                "Rule 2: reduce or avoid trading during {} (win rate < {})",
                low.join(", "),
                pct0(config.low_win_rate)
            ),
        ));
    }

    for p in active.iter().filter(|p| p.stats.total_pnl < 0.0) {
        out.push(Insight::new(
            C,
            format!("Avoid {}: total net P&L {}", p.phase, usd(p.stats.total_pnl)),
        ));
    }

    if let Some(p) = argmax(active, |p| p.stats.size.mean) {
        out.push(Insight::new(
            C,
            format!(
                "Rule 3: largest positions during {} ({} average); check this matches its win rate",
                p.phase,
                usd(p.stats.size.mean)
            ),
        ));
    }

    for p in active {
        let (Some(long), Some(short)) = (
            summary.cell(p.phase, TradeDirection::Long),
            summary.cell(p.phase, TradeDirection::Short),
        ) else {
            continue;
        };
        if long.is_empty() || short.is_empty() {
            continue;
        }
        let favoured = if long.win_rate > short.win_rate + config.direction_edge {
            Some((TradeDirection::Long, long.win_rate, short.win_rate))
        } else if short.win_rate > long.win_rate + config.direction_edge {
            Some((TradeDirection::Short, short.win_rate, long.win_rate))
        } else {
            None
        };
        if let Some((direction, better, worse)) = favoured {
            out.push(Insight::new(
                C,
                format!(
                    "Rule 4: favour {} positions during {} ({} vs {} win rate)",
                    direction.label().to_uppercase(),
                    p.phase,
                    pct(better),
                    pct(worse)
                ),
            ));
        }
    }
}

fn statistical_findings(tests: &SignificanceReport, out: &mut Vec<Insight>) {
    use InsightCategory::StatisticalFinding as C;

    for line in significance_lines(tests) {
        out.push(Insight::new(C, line));
    }
}

/// One line per test: statistic, p-value, significance label.
pub fn significance_lines(tests: &SignificanceReport) -> Vec<String> {
    let label = |p: f64| {
        if tests.is_significant(p) {
            "significant"
        } else {
            "not significant"
        }
    };

    let anova = match &tests.anova {
        Some(a) => format!(
            "ANOVA net P&L across phases: F = {:.3}, p = {} ({})",
            a.f_statistic,
            p_value(a.p_value),
            label(a.p_value)
        ),
        None => "ANOVA net P&L across phases: insufficient data".to_string(),
    };
    let chi = match &tests.chi_square {
        Some(c) => format!(
            "Chi-square direction vs phase: chi2 = {:.3}, dof = {}{}, p = {} ({})",
            c.statistic,
            c.dof,
            if c.yates { ", Yates corrected" } else { "" },
            p_value(c.p_value),
            label(c.p_value)
        ),
        None => "Chi-square direction vs phase: insufficient data".to_string(),
    };
    let corr = match &tests.correlation {
        Some(c) => format!(
            "Correlation position size vs sentiment score: r = {:.3}, n = {}, p = {} ({})",
            c.r,
            c.n,
            p_value(c.p_value),
            label(c.p_value)
        ),
        None => "Correlation position size vs sentiment score: insufficient data".to_string(),
    };
    vec![anova, chi, corr]
}

/// `0.5` → `50.0%`.
pub fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn pct0(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// `1234567` → `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `-1234.5` → `-$1,234.50`.
pub fn usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", thousands(cents / 100), cents % 100)
}

fn p_value(p: f64) -> String {
    if p > 0.0 && p < 1e-4 {
        format!("{p:.2e}")
    } else {
        format!("{p:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::merged;

    fn texts(insights: &[Insight], category: InsightCategory) -> Vec<&str> {
        insights
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.text.as_str())
            .collect()
    }

    fn run(records: &[sentilab_core::domain::MergedRecord]) -> Vec<Insight> {
        let summary = SentimentSummary::compute(records);
        let tests = SignificanceReport::compute(records, 0.001);
        generate(&summary, &tests, &InsightsConfig::default())
    }

    fn scenario() -> Vec<Insight> {
        run(&[
            merged(0, 1, 15.0, 10.0, "Open Long", 100.0),
            merged(1, 1, 15.0, -5.0, "Close Long", 200.0),
            merged(2, 2, 65.0, 20.0, "Open Short", 300.0),
        ])
    }

    #[test]
    fn optimal_conditions_pick_greed() {
        let insights = scenario();
        let optimal = texts(&insights, InsightCategory::OptimalConditions);
        assert_eq!(optimal.len(), 3);
        assert!(optimal[0].contains("100.0% during Greed"));
        assert!(optimal[0].contains("increase trading in Greed"));
        assert!(optimal[1].contains("$20.00"));
        assert!(optimal[2].contains("$20.00 per trade during Greed"));
    }

    #[test]
    fn risk_patterns_cover_extremes_and_size_volatility() {
        let insights = scenario();
        let risk = texts(&insights, InsightCategory::RiskPattern);
        assert_eq!(risk.len(), 2);
        assert_eq!(risk[0], "Extreme Fear: 50.0% win rate, average loss -$5.00");
        assert!(risk[1].contains("volatility during Extreme Fear"));
    }

    #[test]
    fn biases_flag_direction_mix() {
        let insights = scenario();
        let bias = texts(&insights, InsightCategory::BehavioralBias);
        assert!(bias[0].starts_with("Position sizing bias: 2.0x larger positions during Greed vs Extreme Fear"));
        assert!(bias.contains(&"Long bias: 100% long trades during Extreme Fear"));
        assert!(bias.contains(&"Short bias: 100% short trades during Greed"));
        // 2 / 1 is not above the default ratio of 2
        assert!(!bias.iter().any(|b| b.starts_with("Overtrading")));
    }

    #[test]
    fn trading_rules_follow_thresholds() {
        let insights = scenario();
        let rules = texts(&insights, InsightCategory::TradingRule);
        assert!(rules[0].starts_with("Rule 1: increase position size during Greed"));
        assert!(!rules.iter().any(|r| r.starts_with("Rule 2")));
        assert!(!rules.iter().any(|r| r.starts_with("Avoid")));
        assert!(rules.iter().any(|r| r.starts_with("Rule 3: largest positions during Greed ($300.00")));
        assert!(!rules.iter().any(|r| r.starts_with("Rule 4")));
    }

    #[test]
    fn losing_phase_and_direction_edge() {
        let insights = run(&[
            merged(0, 1, 50.0, -3.0, "Open Long", 100.0),
            merged(1, 1, 50.0, -4.0, "Open Long", 100.0),
            merged(2, 1, 50.0, 2.0, "Open Short", 100.0),
            merged(3, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(4, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(5, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(6, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(7, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(8, 2, 30.0, 1.0, "Open Long", 100.0),
            merged(9, 2, 30.0, 1.0, "Open Long", 100.0),
        ]);
        let rules = texts(&insights, InsightCategory::TradingRule);
        assert!(rules.iter().any(|r| r.starts_with("Rule 2: reduce or avoid trading during Neutral")));
        assert!(rules.contains(&"Avoid Neutral: total net P&L -$5.00"));
        assert!(rules.iter().any(|r| r.starts_with("Rule 4: favour SHORT positions during Neutral")));

        let bias = texts(&insights, InsightCategory::BehavioralBias);
        assert!(bias.contains(&"Overtrading alert: 7 trades during Fear vs 3 during Neutral"));
        // Equal mean sizes: no sizing-ratio line
        assert!(!bias.iter().any(|b| b.starts_with("Position sizing")));
    }

    #[test]
    fn statistical_lines_always_three() {
        let insights = scenario();
        let stats = texts(&insights, InsightCategory::StatisticalFinding);
        assert_eq!(stats.len(), 3);
        assert!(stats[0].starts_with("ANOVA"));
        assert!(stats[1].starts_with("Chi-square"));
        assert!(stats[2].starts_with("Correlation"));

        let empty = run(&[]);
        assert_eq!(empty.len(), 3);
        assert!(empty.iter().all(|i| i.text.ends_with("insufficient data")));
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(1234.5), "$1,234.50");
        assert_eq!(usd(-1_000_000.0), "-$1,000,000.00");
        assert_eq!(usd(-0.001), "$0.00");
        assert_eq!(usd(999.999), "$1,000.00");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(211_224), "211,224");
        assert_eq!(thousands(12_345_678), "12,345,678");
    }
}
