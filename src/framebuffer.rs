//! Page-packed 1-bit framebuffer.
//!
//! The layout matches SSD1306/SH1106 GDDRAM: the buffer is a sequence of
//! pages, each page one byte per column, and bit `n` of a byte is the pixel
//! at row `page * 8 + n`. Serialising the buffer is therefore a plain slice
//! walk, page 0 first, columns left to right.

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::BinaryColor,
    Pixel,
};
use heapless::Vec;

use crate::error::OledError;

/// Widest supported buffer (SH1106 GDDRAM).
pub const MAX_WIDTH: u32 = 132;
/// Tallest supported buffer.
pub const MAX_HEIGHT: u32 = 64;
/// Bytes needed for the largest buffer.
pub const BUFFER_CAPACITY: usize = (MAX_WIDTH * MAX_HEIGHT / 8) as usize;

/// Value written to a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelValue {
    /// Clear the pixel.
    Off,
    /// Light the pixel.
    On,
    /// Flip whatever is there (XOR drawing).
    Invert,
}

impl From<BinaryColor> for PixelValue {
    fn from(color: BinaryColor) -> Self {
        match color {
            BinaryColor::On => PixelValue::On,
            BinaryColor::Off => PixelValue::Off,
        }
    }
}

impl From<bool> for PixelValue {
    fn from(on: bool) -> Self {
        if on {
            PixelValue::On
        } else {
            PixelValue::Off
        }
    }
}

/// In-memory copy of the panel's GDDRAM.
///
/// Dimensions are fixed at construction; the buffer never grows or shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    buffer: Vec<u8, BUFFER_CAPACITY>,
}

impl Framebuffer {
    /// Allocate a cleared `width`×`height` buffer.
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if either dimension is zero or exceeds
    /// [`MAX_WIDTH`]/[`MAX_HEIGHT`].
    pub fn new(width: u32, height: u32) -> Result<Self, OledError> {
        if !(1..=MAX_WIDTH).contains(&width) || !(1..=MAX_HEIGHT).contains(&height) {
            return Err(OledError::OutOfRange);
        }
        let len = (width * height.div_ceil(8)) as usize;
        let mut buffer = Vec::new();
        buffer.resize(len, 0).map_err(|_| OledError::OutOfRange)?;
        Ok(Self {
            width,
            height,
            buffer,
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

    /// Number of 8-row pages (`ceil(height / 8)`).
    pub fn page_count(&self) -> u32 {
        self.height.div_ceil(8)
    }

    /// `true` if `(x, y)` lies in `[0, width) × [0, height)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Write one pixel.
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if `(x, y)` is outside the buffer. Drawing
    /// primitives clip instead; this is the strict per-pixel entry point.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: PixelValue) -> Result<(), OledError> {
        if !self.contains(x, y) {
            return Err(OledError::OutOfRange);
        }
        self.paint(x, y, value);
        Ok(())
    }

    /// Read one pixel; the result is always [`PixelValue::On`] or
    /// [`PixelValue::Off`].
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if `(x, y)` is outside the buffer.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<PixelValue, OledError> {
        if !self.contains(x, y) {
            return Err(OledError::OutOfRange);
        }
        Ok(self.is_set(x, y).into())
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Apply `value` to every pixel.
    pub fn fill(&mut self, value: PixelValue) {
        for byte in self.buffer.iter_mut() {
            *byte = match value {
                PixelValue::Off => 0x00,
                PixelValue::On => 0xFF,
                PixelValue::Invert => !*byte,
            };
        }
    }

    /// Pages in transfer order: page 0 first, each page left to right.
    pub fn as_pages(&self) -> core::slice::Chunks<'_, u8> {
        self.buffer.chunks(self.width as usize)
    }

    /// One page, or `None` past the last page.
    pub fn page(&self, index: u32) -> Option<&[u8]> {
        if index >= self.page_count() {
            return None;
        }
        let start = (index * self.width) as usize;
        Some(&self.buffer[start..start + self.width as usize])
    }

    /// The whole buffer, in page order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Write one pixel, silently ignoring coordinates outside the buffer.
    pub(crate) fn paint(&mut self, x: i32, y: i32, value: PixelValue) {
        if !self.contains(x, y) {
            return;
        }
        let (index, mask) = self.locate(x as u32, y as u32);
        let byte = &mut self.buffer[index];
        match value {
            PixelValue::Off => *byte &= !mask,
            PixelValue::On => *byte |= mask,
            PixelValue::Invert => *byte ^= mask,
        }
    }

    /// Pixel state, `false` outside the buffer.
    pub(crate) fn is_set(&self, x: i32, y: i32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        let (index, mask) = self.locate(x as u32, y as u32);
        self.buffer[index] & mask != 0
    }

    /// Apply `value` to every pixel set in `mask`. Both buffers must share
    /// dimensions.
    pub(crate) fn apply_mask(&mut self, mask: &Framebuffer, value: PixelValue) {
        debug_assert_eq!((self.width, self.height), (mask.width, mask.height));
        for (dst, &m) in self.buffer.iter_mut().zip(mask.buffer.iter()) {
            match value {
                PixelValue::Off => *dst &= !m,
                PixelValue::On => *dst |= m,
                PixelValue::Invert => *dst ^= m,
            }
        }
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let index = ((y / 8) * self.width + x) as usize;
        (index, 1 << (y % 8))
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Lets any `embedded-graphics` drawable render into the buffer. Pixels
/// outside the buffer are clipped.
impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.paint(point.x, point.y, color.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::{
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
    };

    #[test]
    fn new_buffer_is_cleared_and_sized_by_pages() {
        let fb = Framebuffer::new(128, 64).unwrap();
        assert_eq!(fb.as_bytes().len(), 1024);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));

        let fb = Framebuffer::new(10, 12).unwrap();
        assert_eq!(fb.page_count(), 2);
        assert_eq!(fb.as_bytes().len(), 20);
    }

    #[test]
    fn new_rejects_bad_dimensions() {
        assert!(matches!(Framebuffer::new(0, 64), Err(OledError::OutOfRange)));
        assert!(matches!(Framebuffer::new(128, 0), Err(OledError::OutOfRange)));
        assert!(matches!(Framebuffer::new(133, 64), Err(OledError::OutOfRange)));
        assert!(matches!(Framebuffer::new(128, 65), Err(OledError::OutOfRange)));
        assert!(Framebuffer::new(MAX_WIDTH, MAX_HEIGHT).is_ok());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut fb = Framebuffer::new(128, 64).unwrap();
        for &(x, y) in &[(0, 0), (127, 63), (5, 7), (5, 8), (64, 31)] {
            fb.set_pixel(x, y, PixelValue::On).unwrap();
            assert_eq!(fb.get_pixel(x, y).unwrap(), PixelValue::On);
            fb.set_pixel(x, y, PixelValue::Off).unwrap();
            assert_eq!(fb.get_pixel(x, y).unwrap(), PixelValue::Off);
        }
    }

    #[test]
    fn invert_flips_pixel() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        fb.set_pixel(3, 3, PixelValue::Invert).unwrap();
        assert_eq!(fb.get_pixel(3, 3).unwrap(), PixelValue::On);
        fb.set_pixel(3, 3, PixelValue::Invert).unwrap();
        assert_eq!(fb.get_pixel(3, 3).unwrap(), PixelValue::Off);
    }

    #[test]
    fn row_seven_is_msb_of_page_zero() {
        let mut fb = Framebuffer::new(4, 16).unwrap();
        fb.set_pixel(2, 7, PixelValue::On).unwrap();
        assert_eq!(fb.page(0).unwrap(), &[0x00, 0x00, 0x80, 0x00]);
        assert_eq!(fb.page(1).unwrap(), &[0x00; 4]);
    }

    #[test]
    fn row_eight_is_lsb_of_page_one() {
        let mut fb = Framebuffer::new(4, 16).unwrap();
        fb.set_pixel(2, 8, PixelValue::On).unwrap();
        assert_eq!(fb.page(0).unwrap(), &[0x00; 4]);
        assert_eq!(fb.page(1).unwrap(), &[0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn row_zero_is_lsb_and_last_row_is_msb() {
        let mut fb = Framebuffer::new(2, 64).unwrap();
        fb.set_pixel(0, 0, PixelValue::On).unwrap();
        fb.set_pixel(1, 63, PixelValue::On).unwrap();
        assert_eq!(fb.page(0).unwrap(), &[0x01, 0x00]);
        assert_eq!(fb.page(7).unwrap(), &[0x00, 0x80]);
        assert!(fb.page(8).is_none());
    }

    #[test]
    fn out_of_range_pixels_error() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        assert!(matches!(
            fb.set_pixel(8, 0, PixelValue::On),
            Err(OledError::OutOfRange)
        ));
        assert!(matches!(
            fb.set_pixel(-1, 0, PixelValue::On),
            Err(OledError::OutOfRange)
        ));
        assert!(matches!(fb.get_pixel(0, 8), Err(OledError::OutOfRange)));
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn paint_clips_silently() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        fb.paint(-1, 3, PixelValue::On);
        fb.paint(3, 100, PixelValue::On);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn as_pages_length_matches_geometry() {
        for &(w, h) in &[(128, 64), (128, 32), (96, 16), (64, 48), (7, 9), (1, 1)] {
            let fb = Framebuffer::new(w, h).unwrap();
            let pages: usize = fb.as_pages().map(|p| p.len()).sum();
            assert_eq!(pages, (w * h.div_ceil(8)) as usize);
            assert_eq!(fb.as_pages().count(), h.div_ceil(8) as usize);
        }
    }

    #[test]
    fn as_pages_orders_page_then_column() {
        let mut fb = Framebuffer::new(3, 16).unwrap();
        fb.set_pixel(0, 0, PixelValue::On).unwrap();
        fb.set_pixel(2, 9, PixelValue::On).unwrap();
        let flat: std::vec::Vec<u8> = fb.as_pages().flatten().copied().collect();
        assert_eq!(flat, [0x01, 0x00, 0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn clear_and_fill() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        fb.fill(PixelValue::On);
        assert!(fb.as_bytes().iter().all(|&b| b == 0xFF));
        fb.set_pixel(0, 0, PixelValue::Off).unwrap();
        fb.fill(PixelValue::Invert);
        assert_eq!(fb.get_pixel(0, 0).unwrap(), PixelValue::On);
        assert_eq!(fb.get_pixel(1, 0).unwrap(), PixelValue::Off);
        fb.clear();
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn apply_mask_combines_bytewise() {
        let mut fb = Framebuffer::new(4, 8).unwrap();
        let mut mask = Framebuffer::new(4, 8).unwrap();
        fb.set_pixel(0, 0, PixelValue::On).unwrap();
        mask.set_pixel(0, 0, PixelValue::On).unwrap();
        mask.set_pixel(1, 0, PixelValue::On).unwrap();

        fb.apply_mask(&mask, PixelValue::Invert);
        assert_eq!(fb.page(0).unwrap(), &[0x00, 0x01, 0x00, 0x00]);
        fb.apply_mask(&mask, PixelValue::On);
        assert_eq!(fb.page(0).unwrap(), &[0x01, 0x01, 0x00, 0x00]);
        fb.apply_mask(&mask, PixelValue::Off);
        assert_eq!(fb.page(0).unwrap(), &[0x00; 4]);
    }

    #[test]
    fn embedded_graphics_draws_and_clips() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        assert_eq!(fb.size(), Size::new(8, 8));
        Rectangle::new(Point::new(6, 6), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();
        let lit = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.get_pixel(x, y).unwrap() == PixelValue::On)
            .count();
        assert_eq!(lit, 4);
    }
}
