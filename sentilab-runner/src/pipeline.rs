//! Stage drivers: merge, aggregate, visualize, insights, and all four in order.
//!
//! Each stage reads its input artifacts from the paths in `PipelineConfig`,
//! produces its outputs, and returns an outcome for the caller to print.
//! Downstream stages always re-read the merged table from disk, so every
//! stage can run on its own.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use sentilab_core::data::{merge_files, read_merged, write_merged, DataError, MergeManifest, MergeReport};
use sentilab_core::domain::MergedRecord;

use crate::aggregate::SentimentSummary;
use crate::charts::{render_all, ChartError};
use crate::config::{ConfigError, PipelineConfig};
use crate::insights::{generate, Insight};
use crate::reporting::{render_report, write_report};
use crate::significance::SignificanceReport;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub report: MergeReport,
    pub manifest: MergeManifest,
    pub merged_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct VisualizeOutcome {
    pub charts: Vec<PathBuf>,
    pub tests: SignificanceReport,
}

#[derive(Debug, Clone)]
pub struct InsightsOutcome {
    pub summary: SentimentSummary,
    pub tests: SignificanceReport,
    pub insights: Vec<Insight>,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub merge: MergeOutcome,
    pub summary: SentimentSummary,
    pub visualize: VisualizeOutcome,
    pub insights: InsightsOutcome,
}

/// Loader/Merger: read both inputs, join, persist the merged table and manifest.
pub fn run_merge(config: &PipelineConfig) -> Result<MergeOutcome, PipelineError> {
    let paths = &config.paths;
    info!(
        trades = %paths.trades.display(),
        sentiment = %paths.sentiment.display(),
        instrument = %config.loader.instrument,
        "merge stage"
    );

    let output = merge_files(&paths.trades, &paths.sentiment, &config.loader)?;
    let manifest = write_merged(&paths.merged, &output.records, &output.report, &output.inputs)?;
    info!(
        merged = output.report.merged_rows,
        excluded = output.report.excluded_rows,
        path = %paths.merged.display(),
        "merged table written"
    );

    Ok(MergeOutcome {
        report: output.report,
        manifest,
        merged_path: paths.merged.clone(),
    })
}

fn load_merged(path: &Path) -> Result<Vec<MergedRecord>, PipelineError> {
    let records = read_merged(path)?;
    info!(rows = records.len(), path = %path.display(), "loaded merged table");
    Ok(records)
}

/// Aggregator: per-phase and phase × direction statistics.
pub fn run_aggregate(config: &PipelineConfig) -> Result<SentimentSummary, PipelineError> {
    let records = load_merged(&config.paths.merged)?;
    let summary = SentimentSummary::compute(&records);
    info!(
        trades = summary.overall.total_trades,
        active_phases = summary.active_phases().count(),
        "aggregate stage"
    );
    Ok(summary)
}

/// Visualizer: five PNG charts plus the significance tests.
pub fn run_visualize(config: &PipelineConfig) -> Result<VisualizeOutcome, PipelineError> {
    let records = load_merged(&config.paths.merged)?;
    let summary = SentimentSummary::compute(&records);
    let charts = render_all(&summary, &config.charts, &config.paths.charts_dir)?;
    let tests = SignificanceReport::compute(&records, config.analysis.significance_level);
    info!(
        charts = charts.len(),
        dir = %config.paths.charts_dir.display(),
        "visualize stage"
    );
    Ok(VisualizeOutcome { charts, tests })
}

/// Insight generator: rule table over the summary and tests, report file.
pub fn run_insights(config: &PipelineConfig) -> Result<InsightsOutcome, PipelineError> {
    let records = load_merged(&config.paths.merged)?;
    let summary = SentimentSummary::compute(&records);
    let tests = SignificanceReport::compute(&records, config.analysis.significance_level);
    let insights = generate(&summary, &tests, &config.insights);

    let instrument = records
        .first()
        .map(|r| r.instrument.as_str())
        .unwrap_or(config.loader.instrument.as_str());
    let text = render_report(Some(instrument), &summary, &tests, &insights);
    write_report(&config.paths.report, &text)?;
    info!(
        insights = insights.len(),
        path = %config.paths.report.display(),
        "insights report written"
    );

    Ok(InsightsOutcome {
        summary,
        tests,
        insights,
        report_path: config.paths.report.clone(),
    })
}

/// All four stages in order; stops at the first error.
pub fn run_all(config: &PipelineConfig) -> Result<RunOutcome, PipelineError> {
    let merge = run_merge(config)?;
    let summary = run_aggregate(config)?;
    let visualize = run_visualize(config)?;
    let insights = run_insights(config)?;
    Ok(RunOutcome {
        merge,
        summary,
        visualize,
        insights,
    })
}
