//! SentiLab Runner: analysis stages over the merged trade/sentiment table.
//!
//! This crate builds on `sentilab-core` to provide:
//! - TOML pipeline configuration
//! - Per-phase and phase × direction aggregation
//! - Significance tests (ANOVA, chi-square, Pearson) from first principles
//! - PNG charts
//! - Rule-based insights and the text report
//! - Stage drivers for the CLI

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod insights;
pub mod pipeline;
pub mod reporting;
pub mod significance;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use aggregate::{DailyPoint, GroupStats, OverallStats, PhaseStats, SentimentSummary};
pub use charts::{render_all, ChartError, CHART_FILES};
pub use config::{ConfigError, PipelineConfig};
pub use insights::{Insight, InsightCategory};
pub use pipeline::{
    run_aggregate, run_all, run_insights, run_merge, run_visualize, InsightsOutcome, MergeOutcome,
    PipelineError, RunOutcome, VisualizeOutcome,
};
pub use significance::SignificanceReport;
