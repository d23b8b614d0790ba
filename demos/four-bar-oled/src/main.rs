//! Four-bar example
//!
//! Standalone hardware demonstration of [`OledDisplay`] on an RP2350 board.
//! Renders four labelled horizontal bars and cycles their values, checking
//! that init, drawing and flushing work on real hardware. The last bar is
//! drawn with XOR so its label stays readable where the bar covers it.
//!
//! # Wiring
//!
//! | Signal    | Pico 2 Pin | Notes           |
//! |-----------|------------|-----------------|
//! | I2C0 SDA  | GP20       |                 |
//! | I2C0 SCL  | GP21       |                 |
//! | OLED VCC  | 3V3        |                 |
//! | OLED GND  | GND        |                 |
//!
//! # Bar Geometry
//!
//! | Property        | Value                                          |
//! |-----------------|------------------------------------------------|
//! | Bar row height  | 16 px (4 bars × 16 = 64 px = full display)    |
//! | Bar fill height | 14 px (1 px margin top and bottom per row)     |
//! | Bar x origin    | 0                                              |
//! | Bar y origin    | `i * 16 + 1`                                   |
//! | Bar pixel width | `value * 128 / 127`                            |
//! | Value range     | 0–127                                          |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp as hal;
use embassy_rp::block::ImageDef;
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Delay, Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Alignment;

use pi_oled_display_rs::{
    ControllerVariant, InterfaceTransport, OledDisplay, PixelValue, Primitive,
    DEFAULT_I2C_ADDRESS,
};

/// Tell the Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = hal::block::ImageDef::secure_exe();

const LABELS: [&str; 4] = ["A", "B", "C", "D"];

// ---------------------------------------------------------------------------
// Hardware pin assignments: change here for hardware revisions.
// The I2C bus is used exclusively by the OLED display in this example.
// ---------------------------------------------------------------------------
// I2C_SDA → GP20  (p.PIN_20)
// I2C_SCL → GP21  (p.PIN_21)
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Four-bar example starting");

    let i2c = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, i2c::Config::default());
    let transport = InterfaceTransport::i2c(i2c, DEFAULT_I2C_ADDRESS);

    let mut oled = unwrap!(
        OledDisplay::open(transport, Delay, 128, 64, ControllerVariant::Ssd1306).ok(),
        "OLED config rejected"
    );

    while let Err(e) = oled.begin() {
        warn!("OLED init failed, retrying: {}", e);
        Timer::after(Duration::from_millis(500)).await;
    }

    // Bar values 0–127, offset so the bars are visually distinct.
    let mut values: [u8; 4] = [0, 32, 64, 96];

    loop {
        oled.clear();

        for (i, &v) in values.iter().enumerate() {
            let y = (i as i32) * 16;
            let bar_width = (v as u32) * 128 / 127;
            let last = i == values.len() - 1;

            oled.draw(&Primitive::Text {
                text: LABELS[i],
                position: Point::new(2, y + 11),
                font: &FONT_6X10,
                fg: PixelValue::On,
                bg: None,
                alignment: Alignment::Left,
            })
            .ok();

            let value = if last { PixelValue::Invert } else { PixelValue::On };
            oled.draw(&Primitive::FilledRoundRect {
                top_left: Point::new(0, y + 1),
                size: Size::new(bar_width, 14),
                radius: 3,
                value,
            })
            .ok();
        }

        oled.display().ok();

        // Increment all bars, wrapping at 127.
        for v in values.iter_mut() {
            *v = (*v + 1) % 128;
        }

        Timer::after(Duration::from_millis(33)).await; // ~30 Hz
    }
}
