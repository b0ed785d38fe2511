//! SentiLab CLI: trader performance against market sentiment.
//!
//! Commands:
//! - `merge`: join the trade log with the Fear & Greed index, write the merged table
//! - `aggregate`: per-phase statistics of the merged table
//! - `visualize`: PNG charts and significance tests
//! - `insights`: rule-based insights and the text report
//! - `run`: all four stages in order

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use sentilab_runner::config::PipelineConfig;
use sentilab_runner::pipeline::{InsightsOutcome, MergeOutcome, VisualizeOutcome};
use sentilab_runner::reporting::{aggregate_summary, merge_summary, significance_block, top_insights};
use sentilab_runner::{run_aggregate, run_all, run_insights, run_merge, run_visualize, SentimentSummary};

#[derive(Parser)]
#[command(
    name = "sentilab",
    about = "SentiLab CLI: trader performance by Fear & Greed sentiment phase"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command. Flags override the config file.
#[derive(Args, Clone, Default)]
struct CommonArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trade log CSV.
    #[arg(long)]
    trades: Option<PathBuf>,

    /// Fear & Greed index CSV.
    #[arg(long)]
    sentiment: Option<PathBuf>,

    /// Merged table CSV (written by merge, read by later stages).
    #[arg(long)]
    merged: Option<PathBuf>,

    /// Directory for the PNG charts.
    #[arg(long)]
    charts_dir: Option<PathBuf>,

    /// Insights report path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join trades with daily sentiment and write the merged table.
    Merge {
        #[command(flatten)]
        common: CommonArgs,

        /// Instrument to keep (e.g. BTC).
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Print per-phase and phase x direction statistics.
    Aggregate {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Render the five charts and run the significance tests.
    Visualize {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Generate insights and write the text report.
    Insights {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run merge, aggregate, visualize and insights in order.
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Instrument to keep (e.g. BTC).
        #[arg(long)]
        instrument: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    execute(Cli::parse().command)
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Merge { common, instrument } => {
            let config = load_config(&common, instrument)?;
            print_merge(&run_merge(&config).context("merge failed")?);
        }
        Commands::Aggregate { common } => {
            let config = load_config(&common, None)?;
            print_summary(&run_aggregate(&config).context("aggregate failed")?);
        }
        Commands::Visualize { common } => {
            let config = load_config(&common, None)?;
            print_visualize(&run_visualize(&config).context("visualize failed")?);
        }
        Commands::Insights { common } => {
            let config = load_config(&common, None)?;
            let outcome = run_insights(&config).context("insights failed")?;
            print_insights(&outcome, config.insights.top_n);
        }
        Commands::Run { common, instrument } => {
            let config = load_config(&common, instrument)?;
            let outcome = run_all(&config).context("pipeline run failed")?;
            print_merge(&outcome.merge);
            print_summary(&outcome.summary);
            print_visualize(&outcome.visualize);
            print_insights(&outcome.insights, config.insights.top_n);
        }
    }

    Ok(())
}

/// Load the config file (or defaults) and apply flag overrides.
fn load_config(common: &CommonArgs, instrument: Option<String>) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(common.config.as_deref()).with_context(|| {
        match &common.config {
            Some(p) => format!("failed to load config {}", p.display()),
            None => "failed to build default config".to_string(),
        }
    })?;

    let paths = &mut config.paths;
    if let Some(p) = &common.trades {
        paths.trades = p.clone();
    }
    if let Some(p) = &common.sentiment {
        paths.sentiment = p.clone();
    }
    if let Some(p) = &common.merged {
        paths.merged = p.clone();
    }
    if let Some(p) = &common.charts_dir {
        paths.charts_dir = p.clone();
    }
    if let Some(p) = &common.report {
        paths.report = p.clone();
    }
    if let Some(symbol) = instrument {
        config.loader.instrument = symbol;
    }
    config.validate().context("invalid configuration")?;

    info!(hash = %config.config_hash(), "configuration loaded");
    Ok(config)
}

fn print_merge(outcome: &MergeOutcome) {
    println!(
        "{}",
        merge_summary(&outcome.report, &outcome.manifest, &outcome.merged_path)
    );
}

fn print_summary(summary: &SentimentSummary) {
    println!("{}", aggregate_summary(summary));
}

fn print_visualize(outcome: &VisualizeOutcome) {
    println!("Charts written:");
    for path in &outcome.charts {
        println!("  {}", path.display());
    }
    println!();
    println!("{}", significance_block(&outcome.tests));
}

fn print_insights(outcome: &InsightsOutcome, top_n: usize) {
    println!("{}", top_insights(&outcome.insights, top_n));
    println!("Report saved to: {}", outcome.report_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "sentilab",
            "merge",
            "--instrument",
            "ETH",
            "--trades",
            "a.csv",
            "--merged",
            "out/m.csv",
        ])
        .unwrap();
        let Commands::Merge { common, instrument } = cli.command else {
            panic!("expected merge");
        };
        let config = load_config(&common, instrument).unwrap();
        assert_eq!(config.loader.instrument, "ETH");
        assert_eq!(config.paths.trades, PathBuf::from("a.csv"));
        assert_eq!(config.paths.merged, PathBuf::from("out/m.csv"));
        assert_eq!(config.paths.sentiment, PipelineConfig::default().paths.sentiment);
    }

    #[test]
    fn instrument_flag_only_on_merge_and_run() {
        assert!(Cli::try_parse_from(["sentilab", "aggregate", "--instrument", "BTC"]).is_err());
        assert!(Cli::try_parse_from(["sentilab", "run", "--instrument", "BTC"]).is_ok());
    }

    #[test]
    fn run_command_writes_every_artifact() {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../sentilab-runner/tests/fixtures");
        let dir = tempfile::tempdir().unwrap();
        let out = |name: &str| dir.path().join(name).display().to_string();
        let trades = fixtures.join("trades_small.csv").display().to_string();
        let sentiment = fixtures.join("fear_greed_small.csv").display().to_string();

        let cli = Cli::try_parse_from([
            "sentilab".to_string(),
            "run".to_string(),
            "--trades".to_string(),
            trades,
            "--sentiment".to_string(),
            sentiment,
            "--merged".to_string(),
            out("merged.csv"),
            "--charts-dir".to_string(),
            out("charts"),
            "--report".to_string(),
            out("report.txt"),
        ])
        .unwrap();
        execute(cli.command).unwrap();

        assert!(dir.path().join("merged.csv").exists());
        assert!(dir.path().join("merged.csv.manifest.json").exists());
        assert!(dir.path().join("charts/trade_timeline.png").exists());
        assert!(dir.path().join("report.txt").exists());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let common = CommonArgs {
            config: Some(PathBuf::from("does/not/exist.toml")),
            ..CommonArgs::default()
        };
        let err = load_config(&common, None).unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.toml"));
    }
}
