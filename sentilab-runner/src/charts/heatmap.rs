//! Win-rate heatmap: phases down, directions across, each cell annotated.

use super::text::base_size;
use super::{
    colors, draw_title, plot_area, win_rate_color, Align, Canvas, ChartFont, TextStyle,
    LABEL_MARGIN,
};
use crate::aggregate::SentimentSummary;
use crate::config::ChartsConfig;
use image::RgbImage;
use sentilab_core::domain::{SentimentPhase, TradeDirection};

pub fn render_win_rate_heatmap(summary: &SentimentSummary, config: &ChartsConfig, font: &ChartFont) -> RgbImage {
    let mut canvas = Canvas::new(config.width, config.height, colors::WHITE);
    let base = base_size(config.width, config.height);
    let area = plot_area(config.width, config.height, LABEL_MARGIN, 0.0, 1.0);

    let rows = SentimentPhase::ALL.len();
    let cols = TradeDirection::GROUPED.len();
    let cell_w = area.width() / cols as f64;
    let cell_h = (area.bottom - area.top) / rows as f64;

    draw_title(&mut canvas, font, &area, base, "Win Rate (%) by Sentiment Phase and Direction");
    let value = TextStyle::new(base, colors::BLACK, Align::Center);
    for phase in SentimentPhase::ALL {
        for (j, direction) in TradeDirection::GROUPED.iter().enumerate() {
            let x0 = area.left + cell_w * j as f64;
            let y0 = area.top + cell_h * phase.index() as f64;
            let rate = summary
                .cell(phase, *direction)
                .filter(|stats| !stats.is_empty())
                .map(|stats| stats.win_rate);

            let color = rate.map(win_rate_color).unwrap_or(colors::EMPTY);
            canvas.fill_rect(x0, y0, x0 + cell_w, y0 + cell_h, color);
            canvas.stroke_rect(x0, y0, x0 + cell_w, y0 + cell_h, colors::WHITE);
            if let Some(rate) = rate {
                let text = format!("{:.1}", rate * 100.0);
                font.draw(&mut canvas, x0 + cell_w / 2.0, y0 + cell_h / 2.0, value, &text);
            }
        }
    }
    canvas.stroke_rect(area.left, area.top, area.right, area.bottom, colors::AXIS);

    let row_label = TextStyle::new(base * 0.85, colors::BLACK, Align::Right);
    for phase in SentimentPhase::ALL {
        let cy = area.top + cell_h * (phase.index() as f64 + 0.5);
        font.draw(&mut canvas, area.left - 6.0, cy, row_label, phase.label());
    }
    let col_label = TextStyle::new(base * 0.85, colors::BLACK, Align::Center);
    for (j, direction) in TradeDirection::GROUPED.iter().enumerate() {
        let cx = area.left + cell_w * (j as f64 + 0.5);
        font.draw(&mut canvas, cx, area.bottom + f64::from(base), col_label, direction.label());
    }

    canvas.into_image()
}
