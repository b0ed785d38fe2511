//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Unknown keys are rejected at every level.

use sentilab_core::data::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for all four stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub loader: LoaderConfig,
    pub analysis: AnalysisConfig,
    pub insights: InsightsConfig,
    pub charts: ChartsConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub trades: PathBuf,
    pub sentiment: PathBuf,
    pub merged: PathBuf,
    pub charts_dir: PathBuf,
    pub report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            trades: PathBuf::from("datasets/historical_data.csv"),
            sentiment: PathBuf::from("datasets/fear_greed_index.csv"),
            merged: PathBuf::from("datasets/merged_btc_sentiment.csv"),
            charts_dir: PathBuf::from("notebooks"),
            report: PathBuf::from("notebooks/insights_report.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// p-value below which a test is labelled significant.
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.001,
        }
    }
}

/// Thresholds for the insight rule table. Rates are fractions in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightsConfig {
    pub high_win_rate: f64,
    pub low_win_rate: f64,
    pub long_bias: f64,
    pub short_bias: f64,
    /// Max/min phase trade-count ratio above which overtrading is flagged.
    pub overtrading_ratio: f64,
    /// Win-rate gap (fraction) for favouring one direction in a phase.
    pub direction_edge: f64,
    /// Insights echoed to stdout.
    pub top_n: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            high_win_rate: 0.55,
            low_win_rate: 0.45,
            long_bias: 0.70,
            short_bias: 0.30,
            overtrading_ratio: 2.0,
            direction_edge: 0.10,
            top_n: 10,
        }
    }
}

/// Chart raster sizes, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartsConfig {
    pub width: u32,
    pub height: u32,
    /// Height of each panel of the trade timeline.
    pub panel_height: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            panel_height: 300,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loader.validate().map_err(ConfigError::Invalid)?;

        let alpha = self.analysis.significance_level;
        if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.significance_level must be in (0, 1), got {alpha}"
            )));
        }

        let ins = &self.insights;
        for (name, value) in [
            ("high_win_rate", ins.high_win_rate),
            ("low_win_rate", ins.low_win_rate),
            ("long_bias", ins.long_bias),
            ("short_bias", ins.short_bias),
            ("direction_edge", ins.direction_edge),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "insights.{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if ins.low_win_rate > ins.high_win_rate {
            return Err(ConfigError::Invalid(format!(
                "insights.low_win_rate ({}) exceeds high_win_rate ({})",
                ins.low_win_rate, ins.high_win_rate
            )));
        }
        if ins.short_bias > ins.long_bias {
            return Err(ConfigError::Invalid(format!(
                "insights.short_bias ({}) exceeds long_bias ({})",
                ins.short_bias, ins.long_bias
            )));
        }
        if ins.overtrading_ratio.is_nan() || ins.overtrading_ratio < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "insights.overtrading_ratio must be >= 1, got {}",
                ins.overtrading_ratio
            )));
        }

        let c = &self.charts;
        if c.width < 100 || c.height < 100 || c.panel_height < 50 {
            return Err(ConfigError::Invalid(format!(
                "chart sizes too small: {}x{} (panel {})",
                c.width, c.height, c.panel_height
            )));
        }
        Ok(())
    }

    /// BLAKE3 of the canonical JSON form. Identifies a configuration in logs.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
