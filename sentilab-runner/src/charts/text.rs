//! Chart text: titles, tick labels, legends and cell values.
//!
//! Glyphs come from the DejaVu Sans face compiled into the binary, so output
//! does not depend on the fonts installed on the host.

use super::{Canvas, ChartError};
use ab_glyph::{FontRef, PxScale};
use image::Rgb;

static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Horizontal anchor of a label relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgb<u8>,
    pub align: Align,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgb<u8>, align: Align) -> Self {
        Self { size, color, align }
    }
}

pub struct ChartFont {
    face: FontRef<'static>,
}

impl ChartFont {
    pub fn load() -> Result<Self, ChartError> {
        let face = FontRef::try_from_slice(DEJAVU_SANS).map_err(|_| ChartError::Font)?;
        Ok(Self { face })
    }

    /// Rendered `(width, height)` of `text` in pixels.
    pub fn measure(&self, size: f32, text: &str) -> (u32, u32) {
        imageproc::drawing::text_size(PxScale::from(size), &self.face, text)
    }

    /// Draw one line with its vertical middle at `y`.
    pub fn draw(&self, canvas: &mut Canvas, x: f64, y: f64, style: TextStyle, text: &str) {
        let (width, _) = self.measure(style.size, text);
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - f64::from(width) / 2.0,
            Align::Right => x - f64::from(width),
        };
        let top = y - f64::from(style.size) / 2.0;
        imageproc::drawing::draw_text_mut(
            canvas.image_mut(),
            style.color,
            left.round() as i32,
            top.round() as i32,
            PxScale::from(style.size),
            &self.face,
            text,
        );
    }

    /// Like `draw`, but breaks at the first space onto a second line when
    /// `text` is wider than `max_width`. `y` is the middle of the first line.
    pub fn draw_fitted(
        &self,
        canvas: &mut Canvas,
        x: f64,
        y: f64,
        max_width: f64,
        style: TextStyle,
        text: &str,
    ) {
        let (width, _) = self.measure(style.size, text);
        match text.split_once(' ') {
            Some((first, rest)) if f64::from(width) > max_width => {
                let line_height = f64::from(style.size) * 1.15;
                self.draw(canvas, x, y, style, first);
                self.draw(canvas, x, y + line_height, style, rest);
            }
            _ => self.draw(canvas, x, y, style, text),
        }
    }
}

/// Base label size for a canvas; titles and ticks scale from it.
pub fn base_size(width: u32, height: u32) -> f32 {
    (width.min(height) as f32 / 30.0).clamp(10.0, 22.0)
}

/// `1530` → `1.5k`, `-2000000` → `-2.0M`, `12` → `12`.
pub fn compact(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
