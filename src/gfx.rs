//! Rendering engine.
//!
//! Stateless rasterisers over a [`Framebuffer`]. Nothing here touches the
//! bus; every function is a pure mutation of the buffer it is given.
//!
//! # Clipping
//!
//! Every primitive clips silently at the buffer edges. Only
//! [`Framebuffer::set_pixel`] reports out-of-range coordinates.
//!
//! # XOR drawing
//!
//! With [`PixelValue::Invert`] each pixel of a shape is flipped exactly once,
//! even where the rasteriser visits it several times (octant seams, span
//! overlaps, triangle edges). Shapes are first rasterised into a scratch
//! coverage mask, then XOR-combined into the target.

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::{MonoFont, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    text::{Alignment, Text},
    Drawable, Pixel,
};

use crate::error::OledError;
use crate::framebuffer::{Framebuffer, PixelValue};

// ── Bitmaps ──────────────────────────────────────────────────────────

/// Borrowed 1-bpp image: row-major, MSB first, each row padded to a whole
/// byte. Used for both font glyphs and raw icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> Bitmap<'a> {
    /// Wrap `data` as a `width`×`height` image.
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if `data` is shorter than
    /// `ceil(width / 8) * height` bytes.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self, OledError> {
        let needed = width.div_ceil(8) as usize * height as usize;
        if data.len() < needed {
            return Err(OledError::OutOfRange);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the bit at (`x`, `y`) is set. `false` outside the image.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = (y * self.width.div_ceil(8) + x / 8) as usize;
        self.data
            .get(index)
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0)
    }
}

// ── Rasteriser plumbing ──────────────────────────────────────────────

/// Clipped plotting surface handed to shape rasterisers.
struct Raster<'p> {
    width: i32,
    height: i32,
    plot: &'p mut dyn FnMut(i32, i32),
}

impl Raster<'_> {
    fn point(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            (self.plot)(x, y);
        }
    }

    fn point_wide(&mut self, x: i64, y: i64) {
        if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
            self.point(x, y);
        }
    }

    /// Inclusive horizontal run; empty when `x1 < x0`.
    fn span(&mut self, x0: i32, x1: i32, y: i32) {
        if y < 0 || y >= self.height {
            return;
        }
        for x in x0.max(0)..=x1.min(self.width - 1) {
            (self.plot)(x, y);
        }
    }

    /// Inclusive vertical run; empty when `y1 < y0`.
    fn column(&mut self, x: i32, y0: i32, y1: i32) {
        if x < 0 || x >= self.width {
            return;
        }
        for y in y0.max(0)..=y1.min(self.height - 1) {
            (self.plot)(x, y);
        }
    }
}

/// Run `shape` against `fb` with `value`, routing `Invert` through a
/// coverage mask.
fn render(fb: &mut Framebuffer, value: PixelValue, shape: impl FnOnce(&mut Raster<'_>)) {
    let width = fb.width() as i32;
    let height = fb.height() as i32;

    if value == PixelValue::Invert {
        let mut mask = fb.clone();
        mask.clear();
        {
            let mut plot = |x: i32, y: i32| mask.paint(x, y, PixelValue::On);
            shape(&mut Raster {
                width,
                height,
                plot: &mut plot,
            });
        }
        fb.apply_mask(&mask, PixelValue::Invert);
    } else {
        let mut plot = |x: i32, y: i32| fb.paint(x, y, value);
        shape(&mut Raster {
            width,
            height,
            plot: &mut plot,
        });
    }
}

/// Exclusive end of a run of `len` pixels starting at `origin`.
fn extent(origin: i32, len: u32) -> i32 {
    origin.saturating_add(i32::try_from(len).unwrap_or(i32::MAX))
}

/// Radii beyond this only add off-buffer work.
const MAX_RADIUS: u32 = i16::MAX as u32;

fn arc_radius(radius: u32) -> i32 {
    radius.min(MAX_RADIUS) as i32
}

/// Arc centres beyond this band cannot reach any buffer with a radius of at
/// most [`MAX_RADIUS`]. Clamping to it keeps `centre ± radius` inside `i32`.
const GUARD: i32 = 1 << 20;

fn guard(v: i32) -> i32 {
    v.clamp(-GUARD, GUARD)
}

/// Midpoint circle walk over one octant: calls `f(x, y)` from `(0, r)`
/// until `x >= y`.
fn octant(r: i32, mut f: impl FnMut(i32, i32)) {
    let mut x = 0;
    let mut y = r;
    let mut d = 1 - r;
    f(x, y);
    while x < y {
        if d < 0 {
            d += 2 * x + 3;
        } else {
            d += 2 * (x - y) + 5;
            y -= 1;
        }
        x += 1;
        f(x, y);
    }
}

/// Outline of a rounded box whose corner arcs are centred on
/// `left`/`right` × `top`/`bottom`. A circle is the case where all four
/// centres coincide.
fn rounded_outline(r: &mut Raster<'_>, left: i32, right: i32, top: i32, bottom: i32, radius: i32) {
    let (left, right, top, bottom) = (guard(left), guard(right), guard(top), guard(bottom));
    r.span(left, right, top - radius);
    r.span(left, right, bottom + radius);
    r.column(left - radius, top, bottom);
    r.column(right + radius, top, bottom);
    octant(radius, |x, y| {
        r.point(right + x, top - y);
        r.point(right + y, top - x);
        r.point(left - x, top - y);
        r.point(left - y, top - x);
        r.point(right + x, bottom + y);
        r.point(right + y, bottom + x);
        r.point(left - x, bottom + y);
        r.point(left - y, bottom + x);
    });
}

/// Filled counterpart of [`rounded_outline`]. Every outline pixel is the
/// end of one of these spans, so the fill always covers the outline.
fn rounded_fill(r: &mut Raster<'_>, left: i32, right: i32, top: i32, bottom: i32, radius: i32) {
    let (left, right, top, bottom) = (guard(left), guard(right), guard(top), guard(bottom));
    for y in top.max(0)..=bottom.min(r.height - 1) {
        r.span(left - radius, right + radius, y);
    }
    octant(radius, |x, y| {
        r.span(left - x, right + x, top - y);
        r.span(left - x, right + x, bottom + y);
        r.span(left - y, right + y, top - x);
        r.span(left - y, right + y, bottom + x);
    });
}

/// Bresenham, normalised (steep axis swap, then left to right) so both
/// endpoint orders walk the same pixels.
///
/// Only the part of the major axis inside the buffer is walked. The error
/// term stays in `[0, dx)` at every step, so its value at the first visible
/// column has a closed form and the walk starts there.
fn line_points(r: &mut Raster<'_>, a: Point, b: Point) {
    let (mut x0, mut y0, mut x1, mut y1) = (
        i64::from(a.x),
        i64::from(a.y),
        i64::from(b.x),
        i64::from(b.y),
    );
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        core::mem::swap(&mut x0, &mut y0);
        core::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        core::mem::swap(&mut x0, &mut x1);
        core::mem::swap(&mut y0, &mut y1);
    }

    let major_len = i64::from(if steep { r.height } else { r.width });
    let first = x0.max(0);
    let last = x1.min(major_len - 1);
    if first > last {
        return;
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let step = if y0 < y1 { 1 } else { -1 };
    let mut err = dx / 2;
    let mut y = y0;
    if dx > 0 && first > x0 {
        let walked = i128::from(dx / 2) - i128::from(first - x0) * i128::from(dy);
        let minor_steps = -walked.div_euclid(i128::from(dx));
        err = (walked + minor_steps * i128::from(dx)) as i64;
        y += step * minor_steps as i64;
    }

    for x in first..=last {
        if steep {
            r.point_wide(y, x);
        } else {
            r.point_wide(x, y);
        }
        err -= dy;
        if err < 0 {
            y += step;
            err += dx;
        }
    }
}

/// Rounded box geometry: arc centres and the clamped radius, or `None` for
/// an empty box.
fn rounded_box(top_left: Point, size: Size, radius: u32) -> Option<(i32, i32, i32, i32, i32)> {
    if size.width == 0 || size.height == 0 {
        return None;
    }
    let radius = arc_radius(radius.min(size.width.min(size.height) / 2));
    let right_edge = extent(top_left.x, size.width) - 1;
    let bottom_edge = extent(top_left.y, size.height) - 1;
    Some((
        top_left.x.saturating_add(radius),
        right_edge.saturating_sub(radius),
        top_left.y.saturating_add(radius),
        bottom_edge.saturating_sub(radius),
        radius,
    ))
}

// ── Primitives ───────────────────────────────────────────────────────

/// One pixel; silently dropped outside the buffer.
pub fn draw_pixel(fb: &mut Framebuffer, at: Point, value: PixelValue) {
    fb.paint(at.x, at.y, value);
}

/// `len` pixels rightwards from `start`.
pub fn draw_hline(fb: &mut Framebuffer, start: Point, len: u32, value: PixelValue) {
    if len == 0 {
        return;
    }
    render(fb, value, |r| {
        r.span(start.x, extent(start.x, len) - 1, start.y)
    });
}

/// `len` pixels downwards from `start`.
pub fn draw_vline(fb: &mut Framebuffer, start: Point, len: u32, value: PixelValue) {
    if len == 0 {
        return;
    }
    render(fb, value, |r| {
        r.column(start.x, start.y, extent(start.y, len) - 1)
    });
}

/// Line between two inclusive endpoints. Swapping the endpoints yields the
/// same pixel set.
pub fn draw_line(fb: &mut Framebuffer, start: Point, end: Point, value: PixelValue) {
    render(fb, value, |r| line_points(r, start, end));
}

/// Border of the half-open box `[x, x + w) × [y, y + h)`.
pub fn draw_rect(fb: &mut Framebuffer, top_left: Point, size: Size, value: PixelValue) {
    draw_round_rect(fb, top_left, size, 0, value);
}

/// Every pixel of the half-open box `[x, x + w) × [y, y + h)`.
pub fn fill_rect(fb: &mut Framebuffer, top_left: Point, size: Size, value: PixelValue) {
    if size.width == 0 || size.height == 0 {
        return;
    }
    let right = extent(top_left.x, size.width) - 1;
    let bottom = extent(top_left.y, size.height) - 1;
    render(fb, value, |r| {
        for y in top_left.y.max(0)..=bottom.min(r.height - 1) {
            r.span(top_left.x, right, y);
        }
    });
}

/// Midpoint circle outline. Radius 0 is a single pixel.
pub fn draw_circle(fb: &mut Framebuffer, center: Point, radius: u32, value: PixelValue) {
    let radius = arc_radius(radius);
    render(fb, value, |r| {
        rounded_outline(r, center.x, center.x, center.y, center.y, radius)
    });
}

/// Solid disk with the same boundary as [`draw_circle`].
pub fn fill_circle(fb: &mut Framebuffer, center: Point, radius: u32, value: PixelValue) {
    let radius = arc_radius(radius);
    render(fb, value, |r| {
        rounded_fill(r, center.x, center.x, center.y, center.y, radius)
    });
}

/// Box border with quarter-circle corners. `radius` is clamped to
/// `min(w, h) / 2`.
pub fn draw_round_rect(
    fb: &mut Framebuffer,
    top_left: Point,
    size: Size,
    radius: u32,
    value: PixelValue,
) {
    if let Some((left, right, top, bottom, radius)) = rounded_box(top_left, size, radius) {
        render(fb, value, |r| {
            rounded_outline(r, left, right, top, bottom, radius)
        });
    }
}

/// Solid counterpart of [`draw_round_rect`]; covers its outline.
pub fn fill_round_rect(
    fb: &mut Framebuffer,
    top_left: Point,
    size: Size,
    radius: u32,
    value: PixelValue,
) {
    if let Some((left, right, top, bottom, radius)) = rounded_box(top_left, size, radius) {
        render(fb, value, |r| rounded_fill(r, left, right, top, bottom, radius));
    }
}

/// The three edges `a`→`b`→`c`→`a`, each drawn with [`draw_line`]'s walk.
pub fn draw_triangle(fb: &mut Framebuffer, vertices: [Point; 3], value: PixelValue) {
    let [a, b, c] = vertices;
    render(fb, value, |r| {
        line_points(r, a, b);
        line_points(r, b, c);
        line_points(r, c, a);
    });
}

/// Scanline fill plus the three edges, so the fill covers
/// [`draw_triangle`]'s outline.
pub fn fill_triangle(fb: &mut Framebuffer, vertices: [Point; 3], value: PixelValue) {
    let mut v = vertices;
    v.sort_unstable_by_key(|p| p.y);
    let [a, b, c] = v;

    render(fb, value, |r| {
        for y in a.y.max(0)..=c.y.min(r.height - 1) {
            let long = edge_x(a, c, y);
            let short = if y < b.y {
                edge_x(a, b, y)
            } else {
                edge_x(b, c, y)
            };
            r.span(long.min(short), long.max(short), y);
        }
        line_points(r, a, b);
        line_points(r, b, c);
        line_points(r, c, a);
    });
}

/// X where edge `p`→`q` crosses row `y`, with `p.y <= y <= q.y`.
fn edge_x(p: Point, q: Point, y: i32) -> i32 {
    if p.y == q.y {
        return p.x;
    }
    let rise = i128::from(q.y) - i128::from(p.y);
    let run = i128::from(q.x) - i128::from(p.x);
    let t = (i128::from(y) - i128::from(p.y)) * run / rise;
    // `t` lies between 0 and `run`, so the result lies between `p.x` and `q.x`.
    i32::try_from(i128::from(p.x) + t).unwrap_or(q.x)
}

// ── Blitting ─────────────────────────────────────────────────────────

/// Draw `glyph` with its top-left corner at `at`, each source bit becoming
/// a `scale`×`scale` block.
///
/// Set bits are drawn with `fg`; clear bits with `bg`, or left untouched
/// when `bg` is `None`. Scale 0 draws nothing.
pub fn blit_glyph(
    fb: &mut Framebuffer,
    at: Point,
    glyph: &Bitmap<'_>,
    scale: u32,
    fg: PixelValue,
    bg: Option<PixelValue>,
) {
    if scale == 0 {
        return;
    }
    let scale = i32::try_from(scale).unwrap_or(i32::MAX);
    let (width, height) = (fb.width() as i32, fb.height() as i32);

    for gy in 0..glyph.height() {
        let y0 = at.y.saturating_add((gy as i32).saturating_mul(scale));
        if y0 >= height {
            break;
        }
        for gx in 0..glyph.width() {
            let x0 = at.x.saturating_add((gx as i32).saturating_mul(scale));
            if x0 >= width {
                break;
            }
            let value = if glyph.is_set(gx, gy) { Some(fg) } else { bg };
            let Some(value) = value else { continue };

            // Blocks never overlap, so XOR needs no mask here.
            for y in y0.max(0)..y0.saturating_add(scale).min(height) {
                for x in x0.max(0)..x0.saturating_add(scale).min(width) {
                    fb.paint(x, y, value);
                }
            }
        }
    }
}

/// Copy the set bits of `bitmap` to `at` with `value`. Clear bits are
/// transparent; anything off-buffer is clipped.
pub fn blit_bitmap(fb: &mut Framebuffer, at: Point, bitmap: &Bitmap<'_>, value: PixelValue) {
    blit_glyph(fb, at, bitmap, 1, value, None);
}

// ── Text ─────────────────────────────────────────────────────────────

/// Adapts `BinaryColor` drawing onto a framebuffer with arbitrary pixel
/// values: `On` maps to the foreground, `Off` to the background (if any).
struct Painter<'f> {
    fb: &'f mut Framebuffer,
    fg: PixelValue,
    bg: Option<PixelValue>,
}

impl OriginDimensions for Painter<'_> {
    fn size(&self) -> Size {
        self.fb.size()
    }
}

impl DrawTarget for Painter<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let value = match color {
                BinaryColor::On => Some(self.fg),
                BinaryColor::Off => self.bg,
            };
            if let Some(value) = value {
                self.fb.paint(point.x, point.y, value);
            }
        }
        Ok(())
    }
}

/// Render `text` in a mono font with its baseline at `position`.
///
/// Returns where the next piece of text would start.
pub fn draw_text(
    fb: &mut Framebuffer,
    text: &str,
    position: Point,
    font: &MonoFont<'_>,
    fg: PixelValue,
    bg: Option<PixelValue>,
    alignment: Alignment,
) -> Point {
    let mut builder = MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On);
    if bg.is_some() {
        builder = builder.background_color(BinaryColor::Off);
    }
    let mut painter = Painter { fb, fg, bg };
    match Text::with_alignment(text, position, builder.build(), alignment).draw(&mut painter) {
        Ok(next) => next,
        Err(never) => match never {},
    }
}
