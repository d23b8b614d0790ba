//! Framebuffered driver for SSD1306-family OLED panels.
//!
//! This crate provides [`OledDisplay`], a session that owns a page-packed
//! 1-bpp [`Framebuffer`], renders shapes, bitmaps and text into it with the
//! [`gfx`] rasterisers, and pushes it to an SSD1306 or SH1106 controller
//! over any [`Transport`] (I2C via `display-interface-i2c`, or 4-wire SPI).
//!
//! Drawing never touches the bus. Content becomes visible only when
//! [`OledDisplay::display`] flushes the framebuffer.
//!
//! # Quick Start
//!
//! ```ignore
//! use embedded_graphics::prelude::*;
//! use pi_oled_display_rs::{
//!     ControllerVariant, InterfaceTransport, OledDisplay, PixelValue, Primitive,
//!     DEFAULT_I2C_ADDRESS,
//! };
//!
//! let transport = InterfaceTransport::i2c(i2c, DEFAULT_I2C_ADDRESS);
//! let mut oled = OledDisplay::open(transport, delay, 128, 64, ControllerVariant::Ssd1306)?;
//! oled.begin()?;
//!
//! oled.draw(&Primitive::FilledCircle {
//!     center: Point::new(64, 32),
//!     radius: 20,
//!     value: PixelValue::On,
//! })?;
//! oled.display()?;
//!
//! let (transport, delay) = oled.close();
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod framebuffer;
pub mod gfx;
pub mod primitive;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use command::{AddressingMode, ScrollDirection};
pub use config::{ControllerVariant, DisplayConfig, Rotation};
pub use controller::{Controller, ControllerState};
pub use error::{OledError, Operation, ProtocolError, TransportError};
pub use framebuffer::{Framebuffer, PixelValue};
pub use gfx::Bitmap;
pub use primitive::Primitive;
pub use session::OledDisplay;
pub use transport::{
    InterfaceTransport, NoReset, ResetLine, ResetPin, SpiTransport, Transport,
    DEFAULT_I2C_ADDRESS,
};
