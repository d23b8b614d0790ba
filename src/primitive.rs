//! Drawing commands as data.
//!
//! A [`Primitive`] describes one shape and the pixel value to draw it with.
//! [`OledDisplay::draw`](crate::OledDisplay::draw) dispatches it to the
//! matching [`gfx`](crate::gfx) rasteriser.

use embedded_graphics::{
    geometry::{Point, Size},
    mono_font::MonoFont,
    text::Alignment,
};

use crate::framebuffer::{Framebuffer, PixelValue};
use crate::gfx::{self, Bitmap};

/// One shape to rasterise, with the [`PixelValue`] to draw it in.
///
/// Every variant clips at the framebuffer edges; none can fail.
#[derive(Debug, Clone, Copy)]
pub enum Primitive<'a> {
    /// Single pixel.
    Point {
        at: Point,
        value: PixelValue,
    },
    /// Straight line; both endpoints are drawn.
    Line {
        start: Point,
        end: Point,
        value: PixelValue,
    },
    /// Border of the half-open box `[x, x + w) × [y, y + h)`.
    Rect {
        top_left: Point,
        size: Size,
        value: PixelValue,
    },
    /// Solid half-open box.
    FilledRect {
        top_left: Point,
        size: Size,
        value: PixelValue,
    },
    /// Circle outline; radius 0 is a single pixel.
    Circle {
        center: Point,
        radius: u32,
        value: PixelValue,
    },
    /// Solid disk covering the matching `Circle`.
    FilledCircle {
        center: Point,
        radius: u32,
        value: PixelValue,
    },
    /// Box border with quarter-circle corners of at most `min(w, h) / 2`.
    RoundRect {
        top_left: Point,
        size: Size,
        radius: u32,
        value: PixelValue,
    },
    /// Solid counterpart of `RoundRect`.
    FilledRoundRect {
        top_left: Point,
        size: Size,
        radius: u32,
        value: PixelValue,
    },
    /// The three edges between `vertices`.
    Triangle {
        vertices: [Point; 3],
        value: PixelValue,
    },
    /// Solid triangle covering the matching `Triangle`.
    FilledTriangle {
        vertices: [Point; 3],
        value: PixelValue,
    },
    /// Font glyph with optional upscaling; `bg: None` is transparent.
    Glyph {
        at: Point,
        glyph: Bitmap<'a>,
        scale: u32,
        fg: PixelValue,
        bg: Option<PixelValue>,
    },
    /// Icon or logo; clear bits are transparent.
    RawBitmap {
        at: Point,
        bitmap: Bitmap<'a>,
        value: PixelValue,
    },
    /// Mono-font string with its baseline at `position`.
    Text {
        text: &'a str,
        position: Point,
        font: &'a MonoFont<'a>,
        fg: PixelValue,
        bg: Option<PixelValue>,
        alignment: Alignment,
    },
}

impl Primitive<'_> {
    /// Rasterise into `fb`, clipping at its edges.
    pub fn render(&self, fb: &mut Framebuffer) {
        match *self {
            Primitive::Point { at, value } => gfx::draw_pixel(fb, at, value),
            Primitive::Line { start, end, value } => gfx::draw_line(fb, start, end, value),
            Primitive::Rect {
                top_left,
                size,
                value,
            } => gfx::draw_rect(fb, top_left, size, value),
            Primitive::FilledRect {
                top_left,
                size,
                value,
            } => gfx::fill_rect(fb, top_left, size, value),
            Primitive::Circle {
                center,
                radius,
                value,
            } => gfx::draw_circle(fb, center, radius, value),
            Primitive::FilledCircle {
                center,
                radius,
                value,
            } => gfx::fill_circle(fb, center, radius, value),
            Primitive::RoundRect {
                top_left,
                size,
                radius,
                value,
            } => gfx::draw_round_rect(fb, top_left, size, radius, value),
            Primitive::FilledRoundRect {
                top_left,
                size,
                radius,
                value,
            } => gfx::fill_round_rect(fb, top_left, size, radius, value),
            Primitive::Triangle { vertices, value } => gfx::draw_triangle(fb, vertices, value),
            Primitive::FilledTriangle { vertices, value } => {
                gfx::fill_triangle(fb, vertices, value)
            }
            Primitive::Glyph {
                at,
                ref glyph,
                scale,
                fg,
                bg,
            } => gfx::blit_glyph(fb, at, glyph, scale, fg, bg),
            Primitive::RawBitmap {
                at,
                ref bitmap,
                value,
            } => gfx::blit_bitmap(fb, at, bitmap, value),
            Primitive::Text {
                text,
                position,
                font,
                fg,
                bg,
                alignment,
            } => {
                gfx::draw_text(fb, text, position, font, fg, bg, alignment);
            }
        }
    }
}
