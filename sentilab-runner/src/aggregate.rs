//! Aggregation of merged trades by sentiment phase.
//!
//! Pure: merged rows in, `SentimentSummary` out. All five phases are always
//! present, in canonical order, and an empty group has every statistic at 0.

use crate::stats::{self, Distribution, Percentiles};
use chrono::NaiveDate;
use sentilab_core::domain::{MergedRecord, SentimentPhase, TradeDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Performance statistics of one group of trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub mean_pnl: f64,
    pub median_pnl: f64,
    /// Mean net P&L of the losing trades only.
    pub avg_loss_pnl: f64,
    pub pnl_percentiles: Percentiles,
    /// Position size in USD.
    pub size: Distribution,
    /// `count` over the distinct days the phase was observed.
    pub trades_per_day: f64,
}

impl GroupStats {
    fn compute(rows: &[&MergedRecord], observed_days: usize) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let pnl: Vec<f64> = rows.iter().map(|r| r.net_pnl).collect();
        let losing: Vec<f64> = rows.iter().filter(|r| r.is_loss).map(|r| r.net_pnl).collect();
        let sizes: Vec<f64> = rows.iter().map(|r| r.size_usd).collect();
        let wins = rows.iter().filter(|r| r.is_win).count();
        let count = rows.len();

        Self {
            count,
            wins,
            losses: losing.len(),
            win_rate: stats::ratio(wins as f64, count as f64),
            total_pnl: pnl.iter().sum(),
            mean_pnl: stats::mean(&pnl),
            median_pnl: stats::median(&pnl),
            avg_loss_pnl: stats::mean(&losing),
            pnl_percentiles: Percentiles::of(&pnl),
            size: Distribution::of(&sizes),
            trades_per_day: stats::ratio(count as f64, observed_days as f64),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Trades per observed day within a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub observed_days: usize,
    pub median: f64,
    /// Sample standard deviation; 0 below two observed days.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub phase: SentimentPhase,
    pub stats: GroupStats,
    pub long_count: usize,
    pub short_count: usize,
    pub other_count: usize,
    /// Over long + short; 0 when neither.
    pub long_ratio: f64,
    pub short_ratio: f64,
    pub daily: DailyActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDirectionStats {
    pub phase: SentimentPhase,
    pub direction: TradeDirection,
    pub stats: GroupStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    /// Sum of the per-phase totals, in canonical order.
    pub total_pnl: f64,
    pub trading_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub long_count: usize,
    pub short_count: usize,
}

/// One trading day of the merged table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub trades: usize,
    pub net_pnl: f64,
    pub cumulative_pnl: f64,
    pub score: f64,
    pub phase: SentimentPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Five entries, canonical phase order.
    pub phases: Vec<PhaseStats>,
    /// Ten entries, phase-major then Long, Short.
    pub grid: Vec<PhaseDirectionStats>,
    pub overall: OverallStats,
    /// Ascending by date.
    pub daily: Vec<DailyPoint>,
    /// Active phases by win rate, best first; ties keep canonical order.
    pub ranking: Vec<SentimentPhase>,
}

impl SentimentSummary {
    pub fn compute(records: &[MergedRecord]) -> Self {
        let mut by_phase: BTreeMap<SentimentPhase, Vec<&MergedRecord>> = BTreeMap::new();
        for record in records {
            by_phase.entry(record.sentiment_phase).or_default().push(record);
        }

        let mut phases = Vec::with_capacity(SentimentPhase::ALL.len());
        let mut grid = Vec::with_capacity(SentimentPhase::ALL.len() * TradeDirection::GROUPED.len());
        for phase in SentimentPhase::ALL {
            let rows = by_phase.get(&phase).map(Vec::as_slice).unwrap_or_default();
            let daily = daily_activity(rows);

            let count_of = |d: TradeDirection| rows.iter().filter(|r| r.trade_direction == d).count();
            let long_count = count_of(TradeDirection::Long);
            let short_count = count_of(TradeDirection::Short);
            let directional = (long_count + short_count) as f64;

            phases.push(PhaseStats {
                phase,
                stats: GroupStats::compute(rows, daily.observed_days),
                long_count,
                short_count,
                other_count: count_of(TradeDirection::Other),
                long_ratio: stats::ratio(long_count as f64, directional),
                short_ratio: stats::ratio(short_count as f64, directional),
                daily,
            });

            for direction in TradeDirection::GROUPED {
                let cell: Vec<&MergedRecord> = rows
                    .iter()
                    .copied()
                    .filter(|r| r.trade_direction == direction)
                    .collect();
                grid.push(PhaseDirectionStats {
                    phase,
                    direction,
                    stats: GroupStats::compute(&cell, daily.observed_days),
                });
            }
        }

        let daily = daily_series(records);
        let wins = phases.iter().map(|p| p.stats.wins).sum();
        let total_trades = records.len();
        let overall = OverallStats {
            total_trades,
            wins,
            losses: phases.iter().map(|p| p.stats.losses).sum(),
            win_rate: stats::ratio(wins as f64, total_trades as f64),
            total_pnl: phases.iter().map(|p| p.stats.total_pnl).sum(),
            trading_days: daily.len(),
            first_date: daily.first().map(|d| d.date),
            last_date: daily.last().map(|d| d.date),
            long_count: phases.iter().map(|p| p.long_count).sum(),
            short_count: phases.iter().map(|p| p.short_count).sum(),
        };

        let ranking = rank_by_win_rate(&phases);

        Self {
            phases,
            grid,
            overall,
            daily,
            ranking,
        }
    }

    pub fn phase(&self, phase: SentimentPhase) -> &PhaseStats {
        &self.phases[phase.index()]
    }

    /// Stats for one phase × direction cell. `Other` has no cell.
    pub fn cell(&self, phase: SentimentPhase, direction: TradeDirection) -> Option<&GroupStats> {
        self.grid
            .iter()
            .find(|c| c.phase == phase && c.direction == direction)
            .map(|c| &c.stats)
    }

    /// Phases with at least one trade, canonical order.
    pub fn active_phases(&self) -> impl Iterator<Item = &PhaseStats> {
        self.phases.iter().filter(|p| !p.stats.is_empty())
    }

    /// Top `n` of the win-rate ranking.
    pub fn best(&self, n: usize) -> &[SentimentPhase] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    /// Bottom `n` of the win-rate ranking, still best first.
    pub fn worst(&self, n: usize) -> &[SentimentPhase] {
        &self.ranking[self.ranking.len().saturating_sub(n)..]
    }
}

fn rank_by_win_rate(phases: &[PhaseStats]) -> Vec<SentimentPhase> {
    let mut active: Vec<&PhaseStats> = phases.iter().filter(|p| !p.stats.is_empty()).collect();
    active.sort_by(|a, b| b.stats.win_rate.total_cmp(&a.stats.win_rate));
    active.into_iter().map(|p| p.phase).collect()
}

fn daily_activity(rows: &[&MergedRecord]) -> DailyActivity {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in rows {
        *per_day.entry(r.date).or_default() += 1;
    }
    let counts: Vec<f64> = per_day.values().map(|&n| n as f64).collect();
    DailyActivity {
        observed_days: counts.len(),
        median: stats::median(&counts),
        std: stats::std_dev(&counts),
        min: stats::min(&counts),
        max: stats::max(&counts),
    }
}

/// One point per trading day, with running net P&L.
pub fn daily_series(records: &[MergedRecord]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, (usize, f64, f64, SentimentPhase)> = BTreeMap::new();
    for r in records {
        let entry = days
            .entry(r.date)
            .or_insert((0, 0.0, r.sentiment_score, r.sentiment_phase));
        entry.0 += 1;
        entry.1 += r.net_pnl;
    }

    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, (trades, net_pnl, score, phase))| {
            cumulative += net_pnl;
            DailyPoint {
                date,
                trades,
                net_pnl,
                cumulative_pnl: cumulative,
                score,
                phase,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::merged;

    #[test]
    fn three_trade_scenario() {
        let records = vec![
            merged(0, 1, 15.0, 10.0, "Open Long", 100.0),
            merged(1, 1, 15.0, -5.0, "Close Long", 200.0),
            merged(2, 2, 65.0, 20.0, "Open Short", 300.0),
        ];
        let s = SentimentSummary::compute(&records);

        assert_eq!(s.phases.len(), 5);
        let ef = &s.phase(SentimentPhase::ExtremeFear).stats;
        assert_eq!(ef.count, 2);
        assert_eq!(ef.win_rate, 0.5);
        assert_eq!(ef.total_pnl, 5.0);
        assert_eq!(ef.avg_loss_pnl, -5.0);
        assert_eq!(ef.size.mean, 150.0);
        assert_eq!(ef.trades_per_day, 2.0);

        let greed = &s.phase(SentimentPhase::Greed).stats;
        assert_eq!(greed.count, 1);
        assert_eq!(greed.win_rate, 1.0);
        assert_eq!(greed.total_pnl, 20.0);

        for phase in [SentimentPhase::Fear, SentimentPhase::Neutral, SentimentPhase::ExtremeGreed] {
            let p = s.phase(phase);
            assert_eq!(p.stats, GroupStats::default());
            assert_eq!(p.long_ratio, 0.0);
            assert!(p.stats.win_rate.is_finite());
        }

        assert_eq!(s.overall.total_trades, 3);
        assert_eq!(s.overall.total_pnl, 25.0);
        assert_eq!(s.overall.trading_days, 2);
    }

    #[test]
    fn phases_in_canonical_order_regardless_of_input() {
        let records = vec![
            merged(0, 3, 95.0, 1.0, "Open Long", 10.0),
            merged(1, 1, 5.0, 1.0, "Open Long", 10.0),
            merged(2, 2, 50.0, 1.0, "Open Long", 10.0),
        ];
        let s = SentimentSummary::compute(&records);
        let order: Vec<SentimentPhase> = s.phases.iter().map(|p| p.phase).collect();
        assert_eq!(order, SentimentPhase::ALL.to_vec());
        assert_eq!(s.grid.len(), 10);
        assert_eq!(s.grid[0].direction, TradeDirection::Long);
        assert_eq!(s.grid[1].direction, TradeDirection::Short);
        assert_eq!(s.grid[9].phase, SentimentPhase::ExtremeGreed);
    }

    #[test]
    fn other_direction_counts_in_phase_not_grid() {
        let records = vec![
            merged(0, 1, 50.0, 1.0, "Open Long", 10.0),
            merged(1, 1, 50.0, -1.0, "Buy", 10.0),
            merged(2, 1, 50.0, 2.0, "Close Short", 10.0),
            merged(3, 1, 50.0, 2.0, "Open Short", 10.0),
        ];
        let s = SentimentSummary::compute(&records);
        let neutral = s.phase(SentimentPhase::Neutral);
        assert_eq!(neutral.stats.count, 4);
        assert_eq!(neutral.other_count, 1);
        assert_eq!(neutral.long_count, 1);
        assert_eq!(neutral.short_count, 2);
        assert!((neutral.long_ratio - 1.0 / 3.0).abs() < 1e-12);

        let long = s.cell(SentimentPhase::Neutral, TradeDirection::Long).unwrap();
        let short = s.cell(SentimentPhase::Neutral, TradeDirection::Short).unwrap();
        assert_eq!(long.count + short.count, 3);
        assert!(s.cell(SentimentPhase::Neutral, TradeDirection::Other).is_none());
    }

    #[test]
    fn daily_activity_per_phase() {
        let records = vec![
            merged(0, 1, 10.0, 1.0, "Open Long", 10.0),
            merged(1, 1, 10.0, 1.0, "Open Long", 10.0),
            merged(2, 1, 10.0, 1.0, "Open Long", 10.0),
            merged(3, 4, 10.0, 1.0, "Open Long", 10.0),
        ];
        let s = SentimentSummary::compute(&records);
        let ef = s.phase(SentimentPhase::ExtremeFear);
        assert_eq!(ef.daily.observed_days, 2);
        assert_eq!(ef.daily.min, 1.0);
        assert_eq!(ef.daily.max, 3.0);
        assert_eq!(ef.daily.median, 2.0);
        assert!((ef.daily.std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(ef.stats.trades_per_day, 2.0);

        let greed = s.phase(SentimentPhase::Greed);
        assert_eq!(greed.daily.std, 0.0);
    }

    #[test]
    fn win_rate_ranking_covers_active_phases() {
        let records = vec![
            merged(0, 1, 10.0, -1.0, "Open Long", 10.0),
            merged(1, 1, 10.0, 1.0, "Open Long", 10.0),
            merged(2, 2, 30.0, 1.0, "Open Long", 10.0),
            merged(3, 3, 50.0, -1.0, "Open Long", 10.0),
            merged(4, 4, 70.0, 2.0, "Open Long", 10.0),
            merged(5, 5, 90.0, 1.0, "Open Long", 10.0),
            merged(6, 5, 90.0, -3.0, "Open Long", 10.0),
        ];
        let s = SentimentSummary::compute(&records);

        // Fear and Greed tie at 100%, Extreme Fear and Extreme Greed at 50%.
        assert_eq!(
            s.ranking,
            vec![
                SentimentPhase::Fear,
                SentimentPhase::Greed,
                SentimentPhase::ExtremeFear,
                SentimentPhase::ExtremeGreed,
                SentimentPhase::Neutral,
            ]
        );
        assert_eq!(s.best(3), &s.ranking[..3]);
        assert_eq!(
            s.worst(3),
            &[SentimentPhase::ExtremeFear, SentimentPhase::ExtremeGreed, SentimentPhase::Neutral]
        );
    }

    #[test]
    fn ranking_skips_empty_phases() {
        let records = vec![
            merged(0, 1, 60.0, 1.0, "Open Long", 10.0),
            merged(1, 2, 10.0, -1.0, "Open Long", 10.0),
        ];
        let s = SentimentSummary::compute(&records);
        assert_eq!(s.ranking, vec![SentimentPhase::Greed, SentimentPhase::ExtremeFear]);
        assert_eq!(s.best(3).len(), 2);
        assert_eq!(s.worst(3).len(), 2);
    }

    #[test]
    fn daily_series_accumulates() {
        let records = vec![
            merged(0, 1, 10.0, 4.0, "Open Long", 10.0),
            merged(1, 1, 10.0, -1.0, "Open Long", 10.0),
            merged(2, 3, 70.0, 2.5, "Open Long", 10.0),
        ];
        let series = daily_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].trades, 2);
        assert_eq!(series[0].cumulative_pnl, 3.0);
        assert_eq!(series[1].cumulative_pnl, 5.5);
        assert_eq!(series[1].phase, SentimentPhase::Greed);
    }

    #[test]
    fn empty_input_gives_full_zero_summary() {
        let s = SentimentSummary::compute(&[]);
        assert_eq!(s.phases.len(), 5);
        assert_eq!(s.overall, OverallStats::default());
        assert!(s.daily.is_empty());
        assert!(s.ranking.is_empty());
        assert!(s.best(3).is_empty());
        assert_eq!(s.active_phases().count(), 0);
    }
}
