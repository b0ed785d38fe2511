//! Significance tests over the merged table.
//!
//! Implements from first principles:
//! - Lanczos approximation for ln(Gamma)
//! - Regularized incomplete beta (Lentz continued fraction)
//! - Regularized incomplete gamma (series / continued fraction)
//! - Student's t, F and chi-square tail probabilities
//! - One-way ANOVA, chi-square test of independence, Pearson correlation
//!
//! Every test returns `None` when its input is degenerate.

use sentilab_core::domain::{MergedRecord, SentimentPhase, TradeDirection};
use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 500;
const EPSILON: f64 = 1e-15;
const TINY: f64 = 1e-300;

// ─── Math primitives ─────────────────────────────────────────────────

/// Lanczos approximation for ln(Gamma(x)), g=7, n=9.
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Gamma(x) * Gamma(1-x) = pi / sin(pi*x)
        let sin_val = (std::f64::consts::PI * x).sin();
        if sin_val.abs() < TINY {
            return f64::INFINITY;
        }
        return std::f64::consts::PI.ln() - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let sum = COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(COEFFICIENTS[0], |acc, (i, &c)| acc + c / (x + i as f64));
    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized incomplete beta I_x(a, b).
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return f64::NAN;
    }
    if x == 0.0 || x == 1.0 {
        return x;
    }
    // Symmetry keeps the continued fraction in its fast-converging region
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let ln_prefix =
        a * x.ln() + b * (1.0 - x).ln() - ln_gamma(a) - ln_gamma(b) + ln_gamma(a + b) - a.ln();

    let mut c = 1.0_f64;
    let mut d = 1.0 / nonzero(1.0 - (a + b) * x / (a + 1.0));
    let mut f = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;

        let even = m * (b - m) * x / ((a + 2.0 * m - 1.0) * (a + 2.0 * m));
        d = 1.0 / nonzero(1.0 + even * d);
        c = nonzero(1.0 + even / c);
        f *= c * d;

        let odd = -((a + m) * (a + b + m) * x) / ((a + 2.0 * m) * (a + 2.0 * m + 1.0));
        d = 1.0 / nonzero(1.0 + odd * d);
        c = nonzero(1.0 + odd / c);
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    ln_prefix.exp() * f
}

/// Upper regularized incomplete gamma Q(a, x) = 1 - P(a, x).
pub fn regularized_upper_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    let ln_prefix = -x + a * x.ln() - ln_gamma(a);

    if x < a + 1.0 {
        // Series for P(a, x)
        let mut ap = a;
        let mut term = 1.0 / a;
        let mut sum = term;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            term *= x / ap;
            sum += term;
            if term.abs() < sum.abs() * EPSILON {
                break;
            }
        }
        return (1.0 - sum * ln_prefix.exp()).clamp(0.0, 1.0);
    }

    // Continued fraction for Q(a, x)
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = 1.0 / nonzero(an * d + b);
        c = nonzero(b + an / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    (ln_prefix.exp() * h).clamp(0.0, 1.0)
}

fn nonzero(v: f64) -> f64 {
    if v.abs() < TINY {
        TINY
    } else {
        v
    }
}

/// Student's t CDF: P(T <= t).
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    if t == 0.0 {
        return 0.5;
    }
    let ib = regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t * t));
    if t > 0.0 {
        1.0 - 0.5 * ib
    } else {
        0.5 * ib
    }
}

/// Two-sided Student's t p-value: P(|T| >= |t|).
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    if t.is_infinite() {
        return 0.0;
    }
    regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// F distribution survival: P(F >= f) with (d1, d2) degrees of freedom.
pub fn f_survival(f: f64, d1: f64, d2: f64) -> f64 {
    if f <= 0.0 {
        return 1.0;
    }
    regularized_incomplete_beta(d2 / 2.0, d1 / 2.0, d2 / (d2 + d1 * f))
}

/// Chi-square survival: P(X >= x) with k degrees of freedom.
pub fn chi_square_survival(x: f64, k: f64) -> f64 {
    regularized_upper_gamma(k / 2.0, x / 2.0)
}

// ─── Hypothesis tests────────────────────────────────────────────────────

/// One-way ANOVA result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub groups: usize,
}

/// One-way ANOVA across the non-empty groups.
///
/// `None` with fewer than two non-empty groups, no within-group degrees of
/// freedom, or zero within-group variance.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<AnovaResult> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n <= k {
        return None;
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in &groups {
        let m = g.iter().sum::<f64>() / g.len() as f64;
        ss_between += g.len() as f64 * (m - grand_mean).powi(2);
        ss_within += g.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }
    if ss_within <= 0.0 {
        return None;
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);
    Some(AnovaResult {
        f_statistic: f,
        p_value: f_survival(f, df_between, df_within),
        df_between,
        df_within,
        groups: k,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    /// Whether Yates' continuity correction was applied.
    pub yates: bool,
}

/// Chi-square test of independence on a contingency table.
///
/// All-zero rows and columns are dropped first. Yates' correction applies
/// when one degree of freedom remains.
pub fn chi_square_independence(table: &[Vec<f64>]) -> Option<ChiSquareResult> {
    let cols = table.first().map(Vec::len).unwrap_or(0);
    let keep_cols: Vec<usize> = (0..cols)
        .filter(|&j| table.iter().map(|row| row[j]).sum::<f64>() > 0.0)
        .collect();
    let rows: Vec<Vec<f64>> = table
        .iter()
        .filter(|row| row.iter().sum::<f64>() > 0.0)
        .map(|row| keep_cols.iter().map(|&j| row[j]).collect())
        .collect();

    let r = rows.len();
    let c = keep_cols.len();
    if r < 2 || c < 2 {
        return None;
    }

    let row_totals: Vec<f64> = rows.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..c).map(|j| rows.iter().map(|row| row[j]).sum()).collect();
    let total: f64 = row_totals.iter().sum();
    let dof = (r - 1) * (c - 1);
    let yates = dof == 1;

    let mut statistic = 0.0;
    for (i, row) in rows.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            let mut diff = (observed - expected).abs();
            if yates {
                diff -= diff.min(0.5);
            }
            statistic += diff * diff / expected;
        }
    }

    Some(ChiSquareResult {
        statistic,
        p_value: chi_square_survival(statistic, dof as f64),
        dof,
        yates,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson correlation with a two-sided p-value (t with n-2 df).
///
/// `None` for mismatched lengths, n < 3, or a constant series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<CorrelationResult> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let p_value = if r.abs() >= 1.0 {
        0.0
    } else {
        t_two_sided_p(r * (df / (1.0 - r * r)).sqrt(), df)
    };
    Some(CorrelationResult { r, p_value, n })
}

// ─── Report ──────────────────────────────────────────────────────────

/// The three tests run by the visualizer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceReport {
    pub alpha: f64,
    /// Net P&L across phases.
    pub anova: Option<AnovaResult>,
    /// Direction (Long/Short/Other) × phase.
    pub chi_square: Option<ChiSquareResult>,
    /// Position size vs sentiment score.
    pub correlation: Option<CorrelationResult>,
}

impl SignificanceReport {
    pub fn compute(records: &[MergedRecord], alpha: f64) -> Self {
        let mut pnl_by_phase: Vec<Vec<f64>> = vec![Vec::new(); SentimentPhase::ALL.len()];
        let directions = [TradeDirection::Long, TradeDirection::Short, TradeDirection::Other];
        let mut table = vec![vec![0.0; SentimentPhase::ALL.len()]; directions.len()];

        for r in records {
            pnl_by_phase[r.sentiment_phase.index()].push(r.net_pnl);
            let row = directions
                .iter()
                .position(|d| *d == r.trade_direction)
                .unwrap_or(directions.len() - 1);
            table[row][r.sentiment_phase.index()] += 1.0;
        }

        let sizes: Vec<f64> = records.iter().map(|r| r.size_usd).collect();
        let scores: Vec<f64> = records.iter().map(|r| r.sentiment_score).collect();

        Self {
            alpha,
            anova: one_way_anova(&pnl_by_phase),
            chi_square: chi_square_independence(&table),
            correlation: pearson(&sizes, &scores),
        }
    }

    pub fn is_significant(&self, p_value: f64) -> bool {
        p_value < self.alpha
    }
}
