//! Raster drawing primitives on top of `image::RgbImage`.
//!
//! Coordinates are `f64` pixels and are clipped to the image; nothing here
//! panics on out-of-range input.

use image::{Rgb, RgbImage};

pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.img
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.img
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill the rectangle spanned by two corners, in any order.
    pub fn fill_rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb<u8>) {
        let (left, right) = (x1.min(x2).round() as i64, x1.max(x2).round() as i64);
        let (top, bottom) = (y1.min(y2).round() as i64, y1.max(y2).round() as i64);
        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(self.img.width() as i64 - 1);
        let bottom = bottom.min(self.img.height() as i64 - 1);
        for y in top..=bottom {
            for x in left..=right {
                self.put(x, y, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb<u8>) {
        self.hline(y1, x1, x2, color);
        self.hline(y2, x1, x2, color);
        self.vline(x1, y1, y2, color);
        self.vline(x2, y1, y2, color);
    }

    pub fn hline(&mut self, y: f64, x1: f64, x2: f64, color: Rgb<u8>) {
        self.line(x1, y, x2, y, color);
    }

    pub fn vline(&mut self, x: f64, y1: f64, y2: f64, color: Rgb<u8>) {
        self.line(x, y1, x, y2, color);
    }

    /// Horizontal line drawn in `dash`-pixel segments.
    pub fn dashed_hline(&mut self, y: f64, x1: f64, x2: f64, dash: u32, color: Rgb<u8>) {
        let y = y.round() as i64;
        let (start, end) = (x1.min(x2).round() as i64, x1.max(x2).round() as i64);
        let period = i64::from(dash.max(1)) * 2;
        for x in start..=end {
            if (x - start) % period < period / 2 {
                self.put(x, y, color);
            }
        }
    }

    /// Bresenham line.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb<u8>) {
        let (mut x, mut y) = (x1.round() as i64, y1.round() as i64);
        let (x_end, y_end) = (x2.round() as i64, y2.round() as i64);
        let dx = (x_end - x).abs();
        let dy = (y_end - y).abs();
        let sx = if x < x_end { 1 } else { -1 };
        let sy = if y < y_end { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.put(x, y, color);
            if x == x_end && y == y_end {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Line thickened vertically by `width` pixels.
    pub fn thick_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: u32, color: Rgb<u8>) {
        let half = f64::from(width.max(1) - 1) / 2.0;
        let mut offset = -half;
        while offset <= half {
            self.line(x1, y1 + offset, x2, y2 + offset, color);
            offset += 1.0;
        }
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
        let r = radius.max(0.0);
        let (x0, x1) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (y0, y1) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (ddx, ddy) = (x as f64 - cx, y as f64 - cy);
                if ddx * ddx + ddy * ddy <= r * r {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Fill vertically between `y_from` and `y_to` at column `x`.
    pub fn fill_column(&mut self, x: f64, y_from: f64, y_to: f64, color: Rgb<u8>) {
        self.fill_rect(x, y_from, x, y_to, color);
    }
}

/// Maps data values onto a rectangular pixel region.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlotArea {
    /// Region between the given edges, with a y-range padded by 5% and widened to
    /// a unit span when flat.
    pub fn new(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        y_min: f64,
        y_max: f64,
    ) -> Self {
        let (mut lo, mut hi) = if y_min <= y_max { (y_min, y_max) } else { (y_max, y_min) };
        if !lo.is_finite() || !hi.is_finite() {
            lo = 0.0;
            hi = 1.0;
        }
        if hi - lo < f64::EPSILON {
            lo -= 0.5;
            hi += 0.5;
        }
        let pad = (hi - lo) * 0.05;
        Self {
            left,
            top,
            right,
            bottom,
            y_min: lo - pad,
            y_max: hi + pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn y(&self, value: f64) -> f64 {
        let t = (value - self.y_min) / (self.y_max - self.y_min);
        self.bottom - t.clamp(0.0, 1.0) * (self.bottom - self.top)
    }

    /// x of the centre of slot `i` out of `n` equal slots.
    pub fn slot_center(&self, i: usize, n: usize) -> f64 {
        let slot = self.width() / n.max(1) as f64;
        self.left + slot * (i as f64 + 0.5)
    }

    pub fn slot_width(&self, n: usize) -> f64 {
        self.width() / n.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn out_of_bounds_drawing_is_clipped() {
        let mut c = Canvas::new(10, 10, WHITE);
        c.line(-50.0, -50.0, 50.0, 50.0, RED);
        c.fill_rect(-5.0, -5.0, 3.0, 3.0, RED);
        c.fill_circle(100.0, 100.0, 5.0, RED);
        assert_eq!(c.pixel(0, 0), RED);
        assert_eq!(c.pixel(9, 9), RED);
        assert_eq!(c.pixel(9, 0), WHITE);
    }

    #[test]
    fn dashed_line_has_gaps() {
        let mut c = Canvas::new(20, 3, WHITE);
        c.dashed_hline(1.0, 0.0, 19.0, 2, RED);
        assert_eq!(c.pixel(0, 1), RED);
        assert_eq!(c.pixel(1, 1), RED);
        assert_eq!(c.pixel(2, 1), WHITE);
        assert_eq!(c.pixel(4, 1), RED);
    }

    #[test]
    fn plot_area_maps_and_pads() {
        let area = PlotArea::new(0.0, 0.0, 100.0, 100.0, 0.0, 10.0);
        assert!(area.y(10.0) < area.y(0.0));
        assert!(area.y(0.0) < 100.0);
        let flat = PlotArea::new(0.0, 0.0, 100.0, 100.0, 3.0, 3.0);
        assert!(flat.y_max > flat.y_min);
        assert_eq!(area.slot_center(0, 5), 10.0);
        assert_eq!(area.slot_width(4), 25.0);
    }
}
