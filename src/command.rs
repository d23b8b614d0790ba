//! SSD1306/SH1106 command grammar.
//!
//! Opcodes are taken verbatim from the controller datasheets. Commands with
//! arguments are sent as one command sequence: opcode first, then the
//! argument bytes in datasheet order.

use heapless::Vec;

/// Longest encoded command (horizontal scroll setup: opcode + 6 arguments).
pub const MAX_COMMAND_LEN: usize = 7;

/// Raw opcodes.
pub mod opcode {
    // ── Fundamental ──────────────────────────────────────────────────
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const DISPLAY_ALL_ON: u8 = 0xA5;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const INVERT_DISPLAY: u8 = 0xA7;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;

    // ── Scrolling (SSD1306 only) ─────────────────────────────────────
    pub const RIGHT_HORIZONTAL_SCROLL: u8 = 0x26;
    pub const LEFT_HORIZONTAL_SCROLL: u8 = 0x27;
    pub const VERTICAL_AND_RIGHT_HORIZONTAL_SCROLL: u8 = 0x29;
    pub const VERTICAL_AND_LEFT_HORIZONTAL_SCROLL: u8 = 0x2A;
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
    pub const ACTIVATE_SCROLL: u8 = 0x2F;
    pub const SET_VERTICAL_SCROLL_AREA: u8 = 0xA3;

    // ── Addressing ───────────────────────────────────────────────────
    pub const SET_LOWER_COLUMN: u8 = 0x00;
    pub const SET_HIGHER_COLUMN: u8 = 0x10;
    pub const MEMORY_ADDR_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_PAGE_START: u8 = 0xB0;

    // ── Hardware configuration ───────────────────────────────────────
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEGMENT_REMAP: u8 = 0xA0;
    pub const SET_MULTIPLEX_RATIO: u8 = 0xA8;
    pub const COM_SCAN_INC: u8 = 0xC0;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;

    // ── Timing and driving scheme ────────────────────────────────────
    pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DETECT: u8 = 0xDB;

    // ── Power ────────────────────────────────────────────────────────
    /// SSD1306 charge pump setting; argument `0x14` enables, `0x10` disables.
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    /// SH1106 DC-DC control; argument `0x8B` enables, `0x8A` disables.
    pub const SET_DC_DC: u8 = 0xAD;
}

/// GDDRAM addressing mode (SSD1306 command 0x20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressingMode {
    /// Column pointer advances, wrapping to the next page at the window edge.
    #[default]
    Horizontal,
    /// Page pointer advances, wrapping to the next column at the window edge.
    Vertical,
    /// Column pointer advances within one page; the page is set explicitly.
    Page,
}

impl AddressingMode {
    fn bits(self) -> u8 {
        match self {
            AddressingMode::Horizontal => 0x00,
            AddressingMode::Vertical => 0x01,
            AddressingMode::Page => 0x02,
        }
    }
}

/// Direction of a hardware scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollDirection {
    Right,
    Left,
    /// Vertical scroll combined with a rightward horizontal scroll.
    DiagonalRight,
    /// Vertical scroll combined with a leftward horizontal scroll.
    DiagonalLeft,
}

/// One controller command with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Panel on (`true`) or off.
    DisplayOn(bool),
    /// Oscillator frequency (high nibble) and clock divide ratio (low nibble).
    DisplayClockDiv(u8),
    /// Multiplex ratio; the argument is `rows - 1`.
    Multiplex(u8),
    DisplayOffset(u8),
    /// RAM row mapped to the first COM line (0..=63).
    StartLine(u8),
    /// SSD1306 internal charge pump.
    ChargePump(bool),
    /// SH1106 internal DC-DC converter.
    DcDc(bool),
    AddressMode(AddressingMode),
    /// Map column 127 to SEG0 when `true`.
    SegmentRemap(bool),
    /// Scan COM lines from COM[N-1] down to COM0 when `true`.
    ReverseComDir(bool),
    /// COM pin hardware configuration byte.
    ComPins(u8),
    Contrast(u8),
    /// Pre-charge period byte (phase 2 high nibble, phase 1 low nibble).
    PreCharge(u8),
    VcomhDeselect(u8),
    /// Light every pixel regardless of RAM contents.
    AllOn(bool),
    Invert(bool),
    /// Column window (start, end), inclusive.
    ColumnAddress(u8, u8),
    /// Page window (start, end), inclusive.
    PageAddress(u8, u8),
    /// Page-mode page pointer.
    PageStart(u8),
    /// Page-mode column pointer (split into two nibble commands).
    ColumnStart(u8),
    /// Configure a continuous scroll between two pages.
    Scroll {
        direction: ScrollDirection,
        start_page: u8,
        end_page: u8,
    },
    /// Vertical scroll area: fixed top rows, scrolled rows.
    VerticalScrollArea(u8, u8),
    EnableScroll(bool),
}

impl Command {
    /// Encode into the opcode + argument bytes sent on the wire.
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        use opcode::*;

        let mut out: Vec<u8, MAX_COMMAND_LEN> = Vec::new();
        // Every arm is at most MAX_COMMAND_LEN bytes, so the push cannot fail.
        let _ = match *self {
            Command::DisplayOn(on) => {
                out.extend_from_slice(&[if on { DISPLAY_ON } else { DISPLAY_OFF }])
            }
            Command::DisplayClockDiv(v) => out.extend_from_slice(&[SET_DISPLAY_CLOCK_DIV, v]),
            Command::Multiplex(v) => out.extend_from_slice(&[SET_MULTIPLEX_RATIO, v]),
            Command::DisplayOffset(v) => out.extend_from_slice(&[SET_DISPLAY_OFFSET, v]),
            Command::StartLine(line) => out.extend_from_slice(&[SET_START_LINE | (line & 0x3F)]),
            Command::ChargePump(on) => {
                out.extend_from_slice(&[SET_CHARGE_PUMP, if on { 0x14 } else { 0x10 }])
            }
            Command::DcDc(on) => out.extend_from_slice(&[SET_DC_DC, if on { 0x8B } else { 0x8A }]),
            Command::AddressMode(mode) => out.extend_from_slice(&[MEMORY_ADDR_MODE, mode.bits()]),
            Command::SegmentRemap(remap) => {
                out.extend_from_slice(&[SET_SEGMENT_REMAP | remap as u8])
            }
            Command::ReverseComDir(rev) => {
                out.extend_from_slice(&[if rev { COM_SCAN_DEC } else { COM_SCAN_INC }])
            }
            Command::ComPins(v) => out.extend_from_slice(&[SET_COM_PINS, v]),
            Command::Contrast(v) => out.extend_from_slice(&[SET_CONTRAST, v]),
            Command::PreCharge(v) => out.extend_from_slice(&[SET_PRECHARGE, v]),
            Command::VcomhDeselect(v) => out.extend_from_slice(&[SET_VCOM_DETECT, v]),
            Command::AllOn(on) => out.extend_from_slice(&[if on {
                DISPLAY_ALL_ON
            } else {
                DISPLAY_ALL_ON_RESUME
            }]),
            Command::Invert(inv) => {
                out.extend_from_slice(&[if inv { INVERT_DISPLAY } else { NORMAL_DISPLAY }])
            }
            Command::ColumnAddress(start, end) => {
                out.extend_from_slice(&[SET_COLUMN_ADDR, start, end])
            }
            Command::PageAddress(start, end) => {
                out.extend_from_slice(&[SET_PAGE_ADDR, start & 0x07, end & 0x07])
            }
            Command::PageStart(page) => out.extend_from_slice(&[SET_PAGE_START | (page & 0x07)]),
            Command::ColumnStart(col) => out.extend_from_slice(&[
                SET_LOWER_COLUMN | (col & 0x0F),
                SET_HIGHER_COLUMN | (col >> 4),
            ]),
            Command::Scroll {
                direction,
                start_page,
                end_page,
            } => {
                let start = start_page & 0x07;
                let end = end_page & 0x07;
                // 0x00 in the interval slot selects the 5-frame step.
                match direction {
                    ScrollDirection::Right => out.extend_from_slice(&[
                        RIGHT_HORIZONTAL_SCROLL,
                        0x00,
                        start,
                        0x00,
                        end,
                        0x00,
                        0xFF,
                    ]),
                    ScrollDirection::Left => out.extend_from_slice(&[
                        LEFT_HORIZONTAL_SCROLL,
                        0x00,
                        start,
                        0x00,
                        end,
                        0x00,
                        0xFF,
                    ]),
                    ScrollDirection::DiagonalRight => out.extend_from_slice(&[
                        VERTICAL_AND_RIGHT_HORIZONTAL_SCROLL,
                        0x00,
                        start,
                        0x00,
                        end,
                        0x01,
                    ]),
                    ScrollDirection::DiagonalLeft => out.extend_from_slice(&[
                        VERTICAL_AND_LEFT_HORIZONTAL_SCROLL,
                        0x00,
                        start,
                        0x00,
                        end,
                        0x01,
                    ]),
                }
            }
            Command::VerticalScrollArea(fixed, scrolled) => {
                out.extend_from_slice(&[SET_VERTICAL_SCROLL_AREA, fixed, scrolled])
            }
            Command::EnableScroll(on) => {
                out.extend_from_slice(&[if on { ACTIVATE_SCROLL } else { DEACTIVATE_SCROLL }])
            }
        };
        out
    }
}
