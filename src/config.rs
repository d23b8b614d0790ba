//! Panel and controller configuration.
//!
//! [`DisplayConfig`] is the single source of panel geometry and controller
//! settings. Everything the init sequence needs (multiplex ratio, COM pin
//! layout, pre-charge period, default contrast, RAM column offset) is
//! derived from it.

use crate::command::AddressingMode;
use crate::error::OledError;

/// Controller chip on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerVariant {
    /// SSD1306: 128-column GDDRAM, all addressing modes, hardware scroll.
    #[default]
    Ssd1306,
    /// SH1106: 132-column GDDRAM, page addressing only, no hardware scroll.
    Sh1106,
}

impl ControllerVariant {
    /// Columns of GDDRAM on the chip.
    pub fn ram_columns(self) -> u32 {
        match self {
            ControllerVariant::Ssd1306 => 128,
            ControllerVariant::Sh1106 => 132,
        }
    }

    /// Whether the chip implements `mode` (the SH1106 is page-only).
    pub fn supports_addressing_mode(self, mode: AddressingMode) -> bool {
        match self {
            ControllerVariant::Ssd1306 => true,
            ControllerVariant::Sh1106 => mode == AddressingMode::Page,
        }
    }

    /// Whether the continuous horizontal scroll commands exist.
    pub fn supports_scroll(self) -> bool {
        self == ControllerVariant::Ssd1306
    }

    fn default_addressing_mode(self) -> AddressingMode {
        match self {
            ControllerVariant::Ssd1306 => AddressingMode::Horizontal,
            ControllerVariant::Sh1106 => AddressingMode::Page,
        }
    }
}

/// Panel orientation achievable with segment remap + COM scan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Native orientation.
    #[default]
    Rotate0,
    /// Upside down: column and row scan both reversed.
    Rotate180,
}

/// Configuration for one display session.
///
/// [`DisplayConfig::default()`] describes the common 128×64 SSD1306 module
/// on its internal charge pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels (16..=64, the multiplex ratio range).
    pub height: u32,
    /// Controller chip driving the panel.
    pub variant: ControllerVariant,
    /// GDDRAM addressing mode selected during init.
    pub addressing_mode: AddressingMode,
    /// Contrast after init. `None` picks the panel default.
    pub contrast: Option<u8>,
    /// Panel powered from an external VCC rather than the internal pump.
    pub external_vcc: bool,
    /// Orientation applied during init.
    pub rotation: Rotation,
    /// First GDDRAM column of the visible area. `None` picks the panel default.
    pub column_offset: Option<u8>,
    /// Flush to hardware after every `draw()`.
    pub auto_flush: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new(128, 64, ControllerVariant::Ssd1306)
    }
}

impl DisplayConfig {
    /// Config for a `width`×`height` panel with variant-appropriate defaults.
    pub fn new(width: u32, height: u32, variant: ControllerVariant) -> Self {
        Self {
            width,
            height,
            variant,
            addressing_mode: variant.default_addressing_mode(),
            contrast: None,
            external_vcc: false,
            rotation: Rotation::Rotate0,
            column_offset: None,
            auto_flush: false,
        }
    }

    /// Use `mode` for GDDRAM writes. Checked by [`validate()`](Self::validate).
    pub fn with_addressing_mode(mut self, mode: AddressingMode) -> Self {
        self.addressing_mode = mode;
        self
    }

    /// Override the panel-default contrast.
    pub fn with_contrast(mut self, contrast: u8) -> Self {
        self.contrast = Some(contrast);
        self
    }

    /// Run from an external VCC supply: no charge pump, different
    /// pre-charge and contrast defaults.
    pub fn with_external_vcc(mut self, external_vcc: bool) -> Self {
        self.external_vcc = external_vcc;
        self
    }

    /// Start in `rotation`.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Override the panel-default GDDRAM column offset.
    pub fn with_column_offset(mut self, offset: u8) -> Self {
        self.column_offset = Some(offset);
        self
    }

    /// Flush after every `draw()` when `true`.
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Number of 8-row pages covering the panel height.
    pub fn pages(&self) -> u32 {
        self.height.div_ceil(8)
    }

    /// Check the geometry and settings against what the controller supports.
    ///
    /// # Errors
    ///
    /// * [`OledError::OutOfRange`] if the panel does not fit the controller.
    /// * [`OledError::Unsupported`] if the addressing mode is unavailable.
    pub fn validate(&self) -> Result<(), OledError> {
        if self.width == 0 || !(16..=64).contains(&self.height) {
            return Err(OledError::OutOfRange);
        }
        let last_column = self
            .width
            .checked_add(u32::from(self.effective_column_offset()))
            .ok_or(OledError::OutOfRange)?;
        if last_column > self.variant.ram_columns() {
            return Err(OledError::OutOfRange);
        }
        if !self.variant.supports_addressing_mode(self.addressing_mode) {
            return Err(OledError::Unsupported);
        }
        Ok(())
    }

    /// Contrast sent during init.
    pub fn effective_contrast(&self) -> u8 {
        if let Some(contrast) = self.contrast {
            return contrast;
        }
        match (self.width, self.height) {
            (_, 32) => 0x8F,
            (96, 16) => {
                if self.external_vcc {
                    0x10
                } else {
                    0xAF
                }
            }
            _ => {
                if self.external_vcc {
                    0x9F
                } else {
                    0xCF
                }
            }
        }
    }

    /// GDDRAM column that maps to visible column 0.
    pub fn effective_column_offset(&self) -> u8 {
        if let Some(offset) = self.column_offset {
            return offset;
        }
        match self.variant {
            ControllerVariant::Sh1106 => 2,
            // Narrow SSD1306 glass is centred on the 128 driver columns.
            ControllerVariant::Ssd1306 => match self.width {
                64 => 32,
                72 => 28,
                _ => 0,
            },
        }
    }

    /// Multiplex ratio argument (`rows - 1`).
    pub(crate) fn multiplex(&self) -> u8 {
        (self.height - 1) as u8
    }

    /// COM pins hardware configuration: sequential for wide, short panels,
    /// alternative otherwise.
    pub(crate) fn com_pins(&self) -> u8 {
        if self.width > 2 * self.height {
            0x02
        } else {
            0x12
        }
    }

    pub(crate) fn precharge(&self) -> u8 {
        if self.external_vcc {
            0x22
        } else {
            0xF1
        }
    }
}
