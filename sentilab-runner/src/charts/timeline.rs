//! Day-by-day charts built from the daily series.
//!
//! The x axis is calendar time: each day from the first to the last trading
//! day owns an equal slot, so gaps between trading days stay visible.

use super::text::base_size;
use super::{
    colors, draw_title, draw_y_ticks, phase_color, plot_area, Align, Canvas, ChartFont, PlotArea,
    TextStyle, TICK_MARGIN,
};
use crate::aggregate::DailyPoint;
use crate::config::ChartsConfig;
use chrono::NaiveDate;
use image::RgbImage;
use sentilab_core::domain::phase::{SCORE_MAX, SCORE_MIN};
use sentilab_core::domain::SentimentPhase;

const FEAR_THRESHOLD: f64 = 20.0;
const GREED_THRESHOLD: f64 = 80.0;

/// Calendar days mapped onto the x range of a plot area.
#[derive(Debug, Clone, Copy)]
struct DateAxis {
    first: NaiveDate,
    last: NaiveDate,
}

impl DateAxis {
    fn of(daily: &[DailyPoint]) -> Option<Self> {
        Some(Self {
            first: daily.first()?.date,
            last: daily.last()?.date,
        })
    }

    fn days(&self) -> usize {
        (self.last - self.first).num_days().max(0) as usize + 1
    }

    fn x(&self, area: &PlotArea, date: NaiveDate) -> f64 {
        let offset = (date - self.first).num_days().max(0) as usize;
        area.slot_center(offset, self.days())
    }

    fn day_width(&self, area: &PlotArea) -> f64 {
        area.slot_width(self.days())
    }

    /// First, middle and last date under `area`.
    fn draw_labels(&self, canvas: &mut Canvas, font: &ChartFont, area: &PlotArea, base: f32) {
        let y = area.bottom + f64::from(base);
        let style = |align| TextStyle::new(base * 0.85, colors::AXIS, align);
        let label = |d: NaiveDate| d.format("%Y-%m-%d").to_string();

        font.draw(canvas, area.left, y, style(Align::Left), &label(self.first));
        if self.last > self.first {
            font.draw(canvas, area.right, y, style(Align::Right), &label(self.last));
        }
        if self.days() > 2 {
            let middle = self.first + chrono::Duration::days((self.days() / 2) as i64);
            font.draw(canvas, self.x(area, middle), y, style(Align::Center), &label(middle));
        }
    }
}

/// Three stacked panels: daily trade count, sentiment score, cumulative net P&L.
pub fn render_trade_timeline(daily: &[DailyPoint], config: &ChartsConfig, font: &ChartFont) -> RgbImage {
    let panel = config.panel_height;
    let mut canvas = Canvas::new(config.width, panel * 3, colors::WHITE);
    let base = base_size(config.width, panel);
    let axis = DateAxis::of(daily);

    // Panel 1: trades per day
    let max_trades = daily.iter().map(|d| d.trades).max().unwrap_or(0) as f64;
    let counts = panel_area(config.width, panel, 0, (0.0, max_trades.max(1.0)));
    draw_title(&mut canvas, font, &counts, base, "Daily Trading Activity (trades)");
    draw_y_ticks(&mut canvas, font, &counts, base);
    canvas.stroke_rect(counts.left, counts.top, counts.right, counts.bottom, colors::AXIS);
    if let Some(axis) = axis {
        let bar = (axis.day_width(&counts) * 0.8).max(1.0);
        for d in daily {
            let cx = axis.x(&counts, d.date);
            canvas.fill_rect(cx - bar / 2.0, counts.y(d.trades as f64), cx + bar / 2.0, counts.bottom, colors::BLUE);
        }
    }

    // Panel 2: sentiment score with fear/greed bands
    let score = panel_area(config.width, panel, 1, (SCORE_MIN, SCORE_MAX));
    draw_title(&mut canvas, font, &score, base, "Fear & Greed Index (extreme bands shaded)");
    canvas.fill_rect(score.left, score.y(FEAR_THRESHOLD), score.right, score.bottom, colors::FEAR_BAND);
    canvas.fill_rect(score.left, score.top, score.right, score.y(GREED_THRESHOLD), colors::GREED_BAND);
    canvas.dashed_hline(score.y(FEAR_THRESHOLD), score.left, score.right, 5, colors::RED);
    canvas.dashed_hline(score.y(GREED_THRESHOLD), score.left, score.right, 5, colors::GREEN);
    draw_y_ticks(&mut canvas, font, &score, base);
    canvas.stroke_rect(score.left, score.top, score.right, score.bottom, colors::AXIS);
    if let Some(axis) = axis {
        polyline(&mut canvas, &score, &axis, daily.iter().map(|d| (d.date, d.score)), colors::ORANGE);
    }

    // Panel 3: cumulative net P&L, filled above/below zero
    let (lo, hi) = cumulative_range(daily);
    let pnl = panel_area(config.width, panel, 2, (lo, hi));
    draw_title(&mut canvas, font, &pnl, base, "Cumulative Net P&L ($)");
    if let Some(axis) = axis {
        fill_to_zero(&mut canvas, &pnl, &axis, daily);
    }
    canvas.hline(pnl.y(0.0), pnl.left, pnl.right, colors::AXIS);
    draw_y_ticks(&mut canvas, font, &pnl, base);
    canvas.stroke_rect(pnl.left, pnl.top, pnl.right, pnl.bottom, colors::AXIS);
    if let Some(axis) = axis {
        polyline(&mut canvas, &pnl, &axis, daily.iter().map(|d| (d.date, d.cumulative_pnl)), colors::BLACK);
        axis.draw_labels(&mut canvas, font, &pnl, base);
    }

    canvas.into_image()
}

/// Cumulative net P&L line with one marker per day coloured by phase.
pub fn render_cumulative_pnl(daily: &[DailyPoint], config: &ChartsConfig, font: &ChartFont) -> RgbImage {
    let mut canvas = Canvas::new(config.width, config.height, colors::WHITE);
    let base = base_size(config.width, config.height);
    let (lo, hi) = cumulative_range(daily);
    let area = plot_area(config.width, config.height, TICK_MARGIN, lo, hi);

    draw_title(&mut canvas, font, &area, base, "Cumulative Net P&L by Sentiment Phase ($)");
    draw_legend(&mut canvas, font, &area, base, daily);
    draw_y_ticks(&mut canvas, font, &area, base);
    canvas.stroke_rect(area.left, area.top, area.right, area.bottom, colors::AXIS);
    canvas.dashed_hline(area.y(0.0), area.left, area.right, 6, colors::AXIS);

    let Some(axis) = DateAxis::of(daily) else {
        return canvas.into_image();
    };
    polyline(&mut canvas, &area, &axis, daily.iter().map(|d| (d.date, d.cumulative_pnl)), colors::BLUE);

    let radius = (f64::from(config.width.min(config.height)) / 150.0).clamp(2.0, 6.0);
    for d in daily {
        canvas.fill_circle(axis.x(&area, d.date), area.y(d.cumulative_pnl), radius, phase_color(d.phase));
    }
    axis.draw_labels(&mut canvas, font, &area, base);

    canvas.into_image()
}

/// Swatch and name of each phase present, right-aligned under the date labels.
fn draw_legend(canvas: &mut Canvas, font: &ChartFont, area: &PlotArea, base: f32, daily: &[DailyPoint]) {
    let style = TextStyle::new(base * 0.8, colors::BLACK, Align::Right);
    let swatch = f64::from(base) * 0.35;
    let y = area.bottom + f64::from(base) * 2.3;
    let mut right = area.right;
    for phase in SentimentPhase::ALL.iter().rev() {
        if !daily.iter().any(|d| d.phase == *phase) {
            continue;
        }
        let (width, _) = font.measure(style.size, phase.label());
        font.draw(canvas, right, y, style, phase.label());
        right -= f64::from(width) + swatch + 4.0;
        canvas.fill_circle(right + swatch, y, swatch, phase_color(*phase));
        right -= swatch + f64::from(base);
    }
}

fn cumulative_range(daily: &[DailyPoint]) -> (f64, f64) {
    daily
        .iter()
        .map(|d| d.cumulative_pnl)
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Plot area of panel `index` (0 = top) with the given y-range.
fn panel_area(width: u32, panel_height: u32, index: u32, range: (f64, f64)) -> PlotArea {
    let base = plot_area(width, panel_height, TICK_MARGIN, range.0, range.1);
    let offset = f64::from(panel_height * index);
    PlotArea {
        top: base.top + offset,
        bottom: base.bottom + offset,
        ..base
    }
}

fn polyline(
    canvas: &mut Canvas,
    area: &PlotArea,
    axis: &DateAxis,
    points: impl Iterator<Item = (NaiveDate, f64)>,
    color: image::Rgb<u8>,
) {
    let mut prev: Option<(f64, f64)> = None;
    for (date, v) in points {
        let point = (axis.x(area, date), area.y(v));
        match prev {
            Some((px, py)) => canvas.thick_line(px, py, point.0, point.1, 2, color),
            None => canvas.fill_circle(point.0, point.1, 1.0, color),
        }
        prev = Some(point);
    }
}

fn fill_to_zero(canvas: &mut Canvas, area: &PlotArea, axis: &DateAxis, daily: &[DailyPoint]) {
    let zero = area.y(0.0);
    let fill = |canvas: &mut Canvas, x: f64, v: f64| {
        let color = if v >= 0.0 { colors::GAIN_FILL } else { colors::LOSS_FILL };
        canvas.fill_column(x, zero, area.y(v), color);
    };

    if let [only] = daily {
        fill(canvas, axis.x(area, only.date), only.cumulative_pnl);
        return;
    }
    for w in daily.windows(2) {
        let (x0, x1) = (axis.x(area, w[0].date), axis.x(area, w[1].date));
        let steps = (x1 - x0).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let v = w[0].cumulative_pnl + (w[1].cumulative_pnl - w[0].cumulative_pnl) * t;
            fill(canvas, x0 + (x1 - x0) * t, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::daily_series;
    use crate::test_support::merged;

    fn count(img: &RgbImage, color: image::Rgb<u8>) -> usize {
        img.pixels().filter(|p| **p == color).count()
    }

    fn font() -> ChartFont {
        ChartFont::load().unwrap()
    }

    fn config() -> ChartsConfig {
        ChartsConfig {
            width: 500,
            height: 300,
            panel_height: 150,
        }
    }

    fn series() -> Vec<DailyPoint> {
        daily_series(&[
            merged(0, 1, 10.0, 8.0, "Open Long", 100.0),
            merged(1, 2, 45.0, -20.0, "Open Long", 100.0),
            merged(2, 2, 45.0, 1.0, "Open Long", 100.0),
            merged(3, 3, 85.0, 30.0, "Open Short", 100.0),
        ])
    }

    /// Mean x of the pixels painted `color` inside the plot region.
    fn centre_x(img: &RgbImage, area: &PlotArea, color: image::Rgb<u8>) -> f64 {
        let xs: Vec<u32> = img
            .enumerate_pixels()
            .filter(|(x, y, p)| {
                **p == color
                    && f64::from(*y) >= area.top
                    && f64::from(*y) <= area.bottom
                    && f64::from(*x) >= area.left
            })
            .map(|(x, _, _)| x)
            .collect();
        assert!(!xs.is_empty());
        xs.iter().map(|&x| f64::from(x)).sum::<f64>() / xs.len() as f64
    }

    #[test]
    fn timeline_has_three_panels_and_both_fills() {
        let img = render_trade_timeline(&series(), &config(), &font());
        assert_eq!(img.dimensions(), (500, 450));
        assert!(count(&img, colors::BLUE) > 0);
        assert!(count(&img, colors::FEAR_BAND) > 0);
        assert!(count(&img, colors::GREED_BAND) > 0);
        assert!(count(&img, colors::GAIN_FILL) > 0);
        assert!(count(&img, colors::LOSS_FILL) > 0);
    }

    #[test]
    fn cumulative_markers_use_phase_colours() {
        let img = render_cumulative_pnl(&series(), &config(), &font());
        assert_eq!(img.dimensions(), (500, 300));
        assert!(count(&img, phase_color(SentimentPhase::ExtremeFear)) > 0);
        assert!(count(&img, phase_color(SentimentPhase::Neutral)) > 0);
        assert!(count(&img, phase_color(SentimentPhase::ExtremeGreed)) > 0);
        assert_eq!(count(&img, phase_color(SentimentPhase::Fear)), 0);
    }

    #[test]
    fn days_are_placed_by_calendar_date() {
        // Trading on Jan 1, Jan 2 and Jan 28: the second day sits next to the
        // first, not halfway across the chart.
        let daily = daily_series(&[
            merged(0, 1, 10.0, 5.0, "Open Long", 100.0),
            merged(1, 2, 50.0, 5.0, "Open Long", 100.0),
            merged(2, 28, 90.0, 5.0, "Open Long", 100.0),
        ]);
        let config = ChartsConfig {
            width: 1000,
            height: 400,
            panel_height: 200,
        };
        let img = render_cumulative_pnl(&daily, &config, &font());
        let area = plot_area(1000, 400, TICK_MARGIN, 0.0, 15.0);

        let jan1 = centre_x(&img, &area, phase_color(SentimentPhase::ExtremeFear));
        let jan2 = centre_x(&img, &area, phase_color(SentimentPhase::Neutral));
        let jan28 = centre_x(&img, &area, phase_color(SentimentPhase::ExtremeGreed));

        let day = area.slot_width(28);
        assert!((jan2 - jan1 - day).abs() < 2.0, "jan1={jan1} jan2={jan2}");
        assert!((jan28 - jan2 - 26.0 * day).abs() < 2.0, "jan2={jan2} jan28={jan28}");
        assert!(jan2 < area.left + area.width() * 0.1);
    }

    #[test]
    fn timeline_bars_follow_dates() {
        let daily = daily_series(&[
            merged(0, 1, 10.0, 5.0, "Open Long", 100.0),
            merged(1, 11, 50.0, 5.0, "Open Long", 100.0),
        ]);
        let img = render_trade_timeline(&daily, &config(), &font());
        let counts = panel_area(500, 150, 0, (0.0, 1.0));
        let day = counts.slot_width(11);

        let blue_columns: Vec<u32> = (0..500)
            .filter(|&x| (0..150).any(|y| *img.get_pixel(x, y) == colors::BLUE))
            .collect();
        let first = *blue_columns.first().unwrap() as f64;
        let last = *blue_columns.last().unwrap() as f64;
        assert!(first < counts.left + day);
        assert!(last > counts.right - day);
        // Nothing drawn for the nine idle days in between.
        let idle = blue_columns
            .iter()
            .filter(|&&x| f64::from(x) > counts.left + day * 1.5 && f64::from(x) < counts.right - day * 1.5)
            .count();
        assert_eq!(idle, 0);
    }

    #[test]
    fn empty_and_single_day_series_render() {
        let img = render_trade_timeline(&[], &config(), &font());
        assert_eq!(img.dimensions(), (500, 450));
        let one = &series()[..1];
        let img = render_trade_timeline(one, &config(), &font());
        assert!(count(&img, colors::GAIN_FILL) > 0);
        let img = render_cumulative_pnl(one, &config(), &font());
        assert!(count(&img, phase_color(SentimentPhase::ExtremeFear)) > 0);
    }
}
