//! Static PNG charts of the merged table.
//!
//! Renderers are pure (`SentimentSummary` in, `RgbImage` out); `render_all`
//! loads the embedded font once, encodes each image and writes it atomically
//! into the charts directory.

mod canvas;
mod distribution;
mod heatmap;
mod text;
mod timeline;

pub use canvas::{Canvas, PlotArea};
pub use distribution::{render_pnl_by_sentiment, render_position_size};
pub use heatmap::render_win_rate_heatmap;
pub use text::{Align, ChartFont, TextStyle};
pub use timeline::{render_cumulative_pnl, render_trade_timeline};

use crate::aggregate::SentimentSummary;
use crate::config::ChartsConfig;
use image::{ImageFormat, Rgb, RgbImage};
use sentilab_core::data::{write_atomic, DataError};
use sentilab_core::domain::SentimentPhase;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const PNL_BY_SENTIMENT: &str = "pnl_by_sentiment.png";
pub const WIN_RATE_HEATMAP: &str = "win_rate_heatmap.png";
pub const POSITION_SIZE_SENTIMENT: &str = "position_size_sentiment.png";
pub const TRADE_TIMELINE: &str = "trade_timeline.png";
pub const CUMULATIVE_PNL_SENTIMENT: &str = "cumulative_pnl_sentiment.png";

/// All chart file names, in rendering order.
pub const CHART_FILES: [&str; 5] = [
    PNL_BY_SENTIMENT,
    WIN_RATE_HEATMAP,
    POSITION_SIZE_SENTIMENT,
    TRADE_TIMELINE,
    CUMULATIVE_PNL_SENTIMENT,
];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to encode {file}: {source}")]
    Encode {
        file: String,
        #[source]
        source: image::ImageError,
    },
    #[error("embedded chart font could not be parsed")]
    Font,
    #[error(transparent)]
    Write(#[from] DataError),
}

/// Common colours.
pub mod colors {
    use image::Rgb;

    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
    pub const EMPTY: Rgb<u8> = Rgb([200, 200, 200]);
    pub const GREEN: Rgb<u8> = Rgb([0, 200, 83]);
    pub const RED: Rgb<u8> = Rgb([255, 68, 68]);
    pub const YELLOW: Rgb<u8> = Rgb([255, 214, 0]);
    pub const BLUE: Rgb<u8> = Rgb([33, 150, 243]);
    pub const ORANGE: Rgb<u8> = Rgb([255, 152, 0]);
    pub const FEAR_BAND: Rgb<u8> = Rgb([255, 225, 225]);
    pub const GREED_BAND: Rgb<u8> = Rgb([220, 245, 225]);
    pub const GAIN_FILL: Rgb<u8> = Rgb([190, 235, 200]);
    pub const LOSS_FILL: Rgb<u8> = Rgb([250, 200, 200]);
}

/// Fill colour for a phase, red (fear) through amber to green (greed).
pub fn phase_color(phase: SentimentPhase) -> Rgb<u8> {
    match phase {
        SentimentPhase::ExtremeFear => Rgb([211, 47, 47]),
        SentimentPhase::Fear => Rgb([245, 124, 0]),
        SentimentPhase::Neutral => Rgb([255, 213, 79]),
        SentimentPhase::Greed => Rgb([124, 179, 66]),
        SentimentPhase::ExtremeGreed => Rgb([56, 142, 60]),
    }
}

pub fn interpolate_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((1.0 - t) * f64::from(a) + t * f64::from(b)).round() as u8;
    Rgb([mix(c1.0[0], c2.0[0]), mix(c1.0[1], c2.0[1]), mix(c1.0[2], c2.0[2])])
}

/// Red at 0, yellow at 0.5, green at 1.
pub fn win_rate_color(rate: f64) -> Rgb<u8> {
    let v = rate.clamp(0.0, 1.0);
    if v < 0.5 {
        interpolate_color(colors::RED, colors::YELLOW, v / 0.5)
    } else {
        interpolate_color(colors::YELLOW, colors::GREEN, (v - 0.5) / 0.5)
    }
}

/// Left margin wide enough for numeric tick labels, in units of the base label size.
pub(crate) const TICK_MARGIN: f64 = 5.0;
/// Left margin wide enough for phase names.
pub(crate) const LABEL_MARGIN: f64 = 8.5;

/// Plot region of a `width` x `height` chart: a title band on top, tick or
/// category labels below and `left_margin` label sizes on the left.
pub(crate) fn plot_area(width: u32, height: u32, left_margin: f64, y_min: f64, y_max: f64) -> PlotArea {
    let base = f64::from(text::base_size(width, height));
    PlotArea::new(
        base * left_margin,
        base * 2.4,
        f64::from(width) - base * 1.5,
        f64::from(height) - base * 3.2,
        y_min,
        y_max,
    )
}

/// Title, left-aligned in the band above `area`.
pub(crate) fn draw_title(canvas: &mut Canvas, font: &ChartFont, area: &PlotArea, base: f32, title: &str) {
    let style = TextStyle::new(base * 1.2, colors::BLACK, Align::Left);
    font.draw(canvas, area.left, area.top / 2.0, style, title);
}

/// Step of 1, 2 or 5 x 10^k giving about `target` ticks across `[lo, hi]`.
pub(crate) fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 {
        return vec![lo];
    }
    let raw = span / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let mut ticks = Vec::new();
    let mut k = (lo / step).ceil();
    while k * step <= hi + step * 1e-9 {
        let v = k * step;
        ticks.push(if v.abs() < step * 1e-9 { 0.0 } else { v });
        k += 1.0;
    }
    ticks
}

/// Tick marks and labels on the left edge of `area`.
pub(crate) fn draw_y_ticks(canvas: &mut Canvas, font: &ChartFont, area: &PlotArea, base: f32) {
    let style = TextStyle::new(base * 0.85, colors::AXIS, Align::Right);
    for v in nice_ticks(area.y_min, area.y_max, 5) {
        let y = area.y(v);
        canvas.hline(y, area.left - 4.0, area.left, colors::AXIS);
        font.draw(canvas, area.left - 6.0, y, style, &text::compact(v));
    }
}

/// PNG-encode `img` and write it atomically to `path`.
pub fn save_png(img: &RgbImage, path: &Path) -> Result<(), ChartError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| ChartError::Encode {
            file: path.display().to_string(),
            source,
        })?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote chart");
    Ok(())
}

/// Render the five charts into `dir`. Returns the written paths in `CHART_FILES` order.
pub fn render_all(
    summary: &SentimentSummary,
    config: &ChartsConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>, ChartError> {
    let font = ChartFont::load()?;
    let images = [
        render_pnl_by_sentiment(summary, config, &font),
        render_win_rate_heatmap(summary, config, &font),
        render_position_size(summary, config, &font),
        render_trade_timeline(&summary.daily, config, &font),
        render_cumulative_pnl(&summary.daily, config, &font),
    ];

    let mut written = Vec::with_capacity(images.len());
    for (name, img) in CHART_FILES.iter().zip(images.iter()) {
        let path = dir.join(name);
        save_png(img, &path)?;
        written.push(path);
    }
    Ok(written)
}
