//! Per-phase distribution charts: net P&L box plot and position size bars.

use super::text::{base_size, compact};
use super::{
    colors, draw_title, draw_y_ticks, nice_ticks, phase_color, plot_area, Align, Canvas, ChartFont,
    TextStyle, LABEL_MARGIN, TICK_MARGIN,
};
use crate::aggregate::SentimentSummary;
use crate::config::ChartsConfig;
use image::RgbImage;
use sentilab_core::domain::SentimentPhase;

/// Box plot of net P&L per phase: P25–P75 box, median bar, P5/P95 whiskers,
/// dashed zero line.
pub fn render_pnl_by_sentiment(summary: &SentimentSummary, config: &ChartsConfig, font: &ChartFont) -> RgbImage {
    let mut canvas = Canvas::new(config.width, config.height, colors::WHITE);
    let base = base_size(config.width, config.height);

    let active: Vec<_> = summary.active_phases().collect();
    let lo = active
        .iter()
        .map(|p| p.stats.pnl_percentiles.p5)
        .fold(0.0, f64::min);
    let hi = active
        .iter()
        .map(|p| p.stats.pnl_percentiles.p95)
        .fold(0.0, f64::max);
    let area = plot_area(config.width, config.height, TICK_MARGIN, lo, hi);
    let n = SentimentPhase::ALL.len();

    draw_title(&mut canvas, font, &area, base, "Net P&L by Sentiment Phase ($)");
    draw_y_ticks(&mut canvas, font, &area, base);
    canvas.stroke_rect(area.left, area.top, area.right, area.bottom, colors::AXIS);
    canvas.dashed_hline(area.y(0.0), area.left, area.right, 6, colors::RED);

    let label = TextStyle::new(base * 0.85, colors::BLACK, Align::Center);
    for phase in &summary.phases {
        let cx = area.slot_center(phase.phase.index(), n);
        font.draw_fitted(
            &mut canvas,
            cx,
            area.bottom + f64::from(base),
            area.slot_width(n),
            label,
            phase.phase.label(),
        );
        if phase.stats.is_empty() {
            continue;
        }
        let q = &phase.stats.pnl_percentiles;
        let half = area.slot_width(n) * 0.3;
        let cap = half * 0.5;

        canvas.vline(cx, area.y(q.p5), area.y(q.p25), colors::AXIS);
        canvas.vline(cx, area.y(q.p75), area.y(q.p95), colors::AXIS);
        canvas.hline(area.y(q.p5), cx - cap, cx + cap, colors::AXIS);
        canvas.hline(area.y(q.p95), cx - cap, cx + cap, colors::AXIS);

        canvas.fill_rect(cx - half, area.y(q.p75), cx + half, area.y(q.p25), phase_color(phase.phase));
        canvas.stroke_rect(cx - half, area.y(q.p75), cx + half, area.y(q.p25), colors::AXIS);
        canvas.thick_line(cx - half, area.y(q.p50), cx + half, area.y(q.p50), 3, colors::BLACK);
    }

    canvas.into_image()
}

/// Horizontal bars of mean position size per phase, with a median tick.
pub fn render_position_size(summary: &SentimentSummary, config: &ChartsConfig, font: &ChartFont) -> RgbImage {
    let mut canvas = Canvas::new(config.width, config.height, colors::WHITE);
    let base = base_size(config.width, config.height);

    let max_size = summary
        .phases
        .iter()
        .map(|p| p.stats.size.mean.max(p.stats.size.median))
        .fold(0.0, f64::max);
    // The vertical axis holds phases; values run along x.
    let area = plot_area(config.width, config.height, LABEL_MARGIN, 0.0, 1.0);
    let x_of = |v: f64| {
        if max_size <= 0.0 {
            area.left
        } else {
            area.left + (v / max_size).clamp(0.0, 1.0) * area.width() * 0.95
        }
    };

    draw_title(&mut canvas, font, &area, base, "Mean Position Size by Sentiment Phase (USD)");
    canvas.vline(area.left, area.top, area.bottom, colors::AXIS);
    canvas.hline(area.bottom, area.left, area.right, colors::AXIS);
    if max_size > 0.0 {
        let tick = TextStyle::new(base * 0.85, colors::AXIS, Align::Center);
        for v in nice_ticks(0.0, max_size, 5) {
            let x = x_of(v);
            canvas.vline(x, area.bottom, area.bottom + 4.0, colors::AXIS);
            font.draw(&mut canvas, x, area.bottom + f64::from(base), tick, &compact(v));
        }
    }

    let n = summary.phases.len().max(1);
    let row_height = (area.bottom - area.top) / n as f64;
    let label = TextStyle::new(base * 0.85, colors::BLACK, Align::Right);
    for phase in &summary.phases {
        // Canonical order from top to bottom
        let cy = area.top + row_height * (phase.phase.index() as f64 + 0.5);
        let half = row_height * 0.3;
        font.draw(&mut canvas, area.left - 6.0, cy, label, phase.phase.label());
        if phase.stats.is_empty() {
            canvas.hline(cy, area.left, area.left + 8.0, colors::EMPTY);
            continue;
        }
        canvas.fill_rect(area.left, cy - half, x_of(phase.stats.size.mean), cy + half, phase_color(phase.phase));
        let mx = x_of(phase.stats.size.median);
        canvas.vline(mx, cy - half * 1.3, cy + half * 1.3, colors::BLACK);
        canvas.vline(mx + 1.0, cy - half * 1.3, cy + half * 1.3, colors::BLACK);
    }

    canvas.into_image()
}
