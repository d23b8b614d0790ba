//! Controller Protocol Driver.
//!
//! [`Controller`] turns logical display operations into SSD1306/SH1106
//! command sequences on a [`Transport`] and tracks the controller's
//! lifecycle state. It knows nothing about drawing; it only moves bytes.
//!
//! # State machine
//!
//! ```text
//!                 initialize()
//! Uninitialized ───────────────► Active ◄──── wake() ──── Sleeping
//!       ▲                        │  ▲  └───── sleep() ──────►
//!       │ initialize() fails     │  │ set_power(true)
//!       └──── (from any state)   ▼  │
//!                              PoweredOff
//!                         (set_power(false))
//! ```
//!
//! Every command except `initialize()` and `set_power(true)` is rejected
//! with [`OledError::InvalidState`] while `Uninitialized` or `PoweredOff`.
//! A failed command leaves the state as it was; a failed `initialize()`
//! always leaves the controller `Uninitialized`.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::command::{AddressingMode, Command, ScrollDirection};
use crate::config::{ControllerVariant, DisplayConfig, Rotation};
use crate::error::{OledError, Operation, ProtocolError, TransportError};
use crate::transport::Transport;

/// Wait after switching the panel on before it accepts further commands.
pub const POWER_UP_DELAY_MS: u32 = 100;

/// Most pages any supported panel has.
const MAX_PAGES: usize = 8;

/// Longest command list built in one go (the init sequence).
const MAX_SEQUENCE: usize = 20;

/// Lifecycle state of the panel controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    /// Init sequence not (successfully) sent yet.
    Uninitialized,
    /// Panel off and charge pump disabled.
    PoweredOff,
    /// Panel on and showing GDDRAM.
    Active,
    /// Panel off, charge pump running, GDDRAM still writable.
    Sleeping,
}

/// Encodes controller operations onto a [`Transport`].
pub struct Controller<T, D> {
    transport: T,
    delay: D,
    config: DisplayConfig,
    state: ControllerState,
    contrast: u8,
    addressing_mode: AddressingMode,
    rotation: Rotation,
    inverted: bool,
    dimmed: bool,
    scrolling: bool,
}

impl<T, D> Controller<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Bind a controller to its transport. No bus traffic is generated.
    ///
    /// # Errors
    ///
    /// Whatever [`DisplayConfig::validate`] reports.
    pub fn new(transport: T, delay: D, config: DisplayConfig) -> Result<Self, OledError> {
        config.validate()?;
        Ok(Self {
            transport,
            delay,
            config,
            state: ControllerState::Uninitialized,
            contrast: config.effective_contrast(),
            addressing_mode: config.addressing_mode,
            rotation: config.rotation,
            inverted: false,
            dimmed: false,
            scrolling: false,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Configuration the controller was created with.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Last contrast set, ignoring [`dim()`](Self::dim).
    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    /// Addressing mode used by [`push_pages()`](Self::push_pages).
    pub fn addressing_mode(&self) -> AddressingMode {
        self.addressing_mode
    }

    /// Orientation currently programmed.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// `true` while the hardware inverts the panel.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// `true` while [`dim(true)`](Self::dim) is in effect.
    pub fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    /// `true` between [`start_scroll()`](Self::start_scroll) and
    /// [`stop_scroll()`](Self::stop_scroll).
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Give back the transport and delay.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Pulse the transport's hardware reset line.
    ///
    /// GDDRAM and every register return to power-on defaults, so the
    /// controller drops back to `Uninitialized`.
    pub fn hardware_reset(&mut self) -> Result<(), ProtocolError> {
        self.transport
            .reset()
            .map_err(|e| ProtocolError::new(Operation::Reset, 0, e))?;
        self.transition(ControllerState::Uninitialized);
        Ok(())
    }

    /// Send the power-up command sequence and wait for the panel.
    ///
    /// Display off, clock divider, multiplex ratio, offset and start line,
    /// charge pump (DC-DC on SH1106), addressing mode, segment/COM
    /// orientation, COM pins, contrast, pre-charge, VCOMH, resume from RAM,
    /// normal polarity, scroll off, display on.
    ///
    /// The controller becomes `Active` only if every command is accepted.
    ///
    /// # Errors
    ///
    /// [`ProtocolError`] naming how many commands landed before the bus
    /// failed; the controller is left `Uninitialized`.
    pub fn initialize(&mut self) -> Result<(), ProtocolError> {
        let sequence = self.init_sequence();
        if let Err(e) = self.send_all(Operation::Initialize, &sequence) {
            self.transition(ControllerState::Uninitialized);
            return Err(e);
        }
        self.delay.delay_ms(POWER_UP_DELAY_MS);

        self.contrast = self.config.effective_contrast();
        self.addressing_mode = self.config.addressing_mode;
        self.rotation = self.config.rotation;
        self.inverted = false;
        self.dimmed = false;
        self.scrolling = false;
        self.transition(ControllerState::Active);
        Ok(())
    }

    fn init_sequence(&self) -> Vec<Command, MAX_SEQUENCE> {
        let cfg = &self.config;
        let pump_on = !cfg.external_vcc;
        let mut seq: Vec<Command, MAX_SEQUENCE> = Vec::new();

        let _ = seq.push(Command::DisplayOn(false));
        let _ = seq.push(Command::DisplayClockDiv(0x80));
        let _ = seq.push(Command::Multiplex(cfg.multiplex()));
        let _ = seq.push(Command::DisplayOffset(0));
        let _ = seq.push(Command::StartLine(0));
        match cfg.variant {
            ControllerVariant::Ssd1306 => {
                let _ = seq.push(Command::ChargePump(pump_on));
                let _ = seq.push(Command::AddressMode(cfg.addressing_mode));
            }
            // SH1106 has no 0x20; it is always in page mode.
            ControllerVariant::Sh1106 => {
                let _ = seq.push(Command::DcDc(pump_on));
            }
        }
        let (remap, reverse) = orientation(cfg.rotation);
        let _ = seq.push(Command::SegmentRemap(remap));
        let _ = seq.push(Command::ReverseComDir(reverse));
        let _ = seq.push(Command::ComPins(cfg.com_pins()));
        let _ = seq.push(Command::Contrast(cfg.effective_contrast()));
        let _ = seq.push(Command::PreCharge(cfg.precharge()));
        let _ = seq.push(Command::VcomhDeselect(0x40));
        let _ = seq.push(Command::AllOn(false));
        let _ = seq.push(Command::Invert(false));
        if cfg.variant.supports_scroll() {
            let _ = seq.push(Command::EnableScroll(false));
        }
        let _ = seq.push(Command::DisplayOn(true));
        seq
    }

    /// Switch the panel on or off.
    ///
    /// Off sends display-off and, on the internal supply, stops the charge
    /// pump (`PoweredOff`). On restarts the pump, sends display-on and waits
    /// [`POWER_UP_DELAY_MS`] (`Active`). GDDRAM contents survive either way.
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] for `set_power(true)` before init, or
    ///   `set_power(false)` while already off.
    /// * [`OledError::Protocol`] on a bus failure; state is unchanged.
    pub fn set_power(&mut self, on: bool) -> Result<(), OledError> {
        let pump = !self.config.external_vcc;
        let mut seq: Vec<Command, 2> = Vec::new();

        if on {
            if self.state == ControllerState::Uninitialized {
                return Err(OledError::InvalidState { state: self.state });
            }
            if pump {
                let _ = seq.push(self.supply_command(true));
            }
            let _ = seq.push(Command::DisplayOn(true));
            self.send_all(Operation::SetPower, &seq)?;
            self.delay.delay_ms(POWER_UP_DELAY_MS);
            self.transition(ControllerState::Active);
        } else {
            self.ensure_ready()?;
            let _ = seq.push(Command::DisplayOn(false));
            if pump {
                let _ = seq.push(self.supply_command(false));
            }
            self.send_all(Operation::SetPower, &seq)?;
            self.transition(ControllerState::PoweredOff);
        }
        Ok(())
    }

    /// Blank the panel but keep the supply running (`Sleeping`).
    pub fn sleep(&mut self) -> Result<(), OledError> {
        self.ensure_ready()?;
        self.send_all(Operation::SetPower, &[Command::DisplayOn(false)])?;
        self.transition(ControllerState::Sleeping);
        Ok(())
    }

    /// Leave `Sleeping` (`Active`).
    pub fn wake(&mut self) -> Result<(), OledError> {
        self.ensure_ready()?;
        self.send_all(Operation::SetPower, &[Command::DisplayOn(true)])?;
        self.transition(ControllerState::Active);
        Ok(())
    }

    // ── Single-register settings ─────────────────────────────────────

    /// Set the contrast level. Also ends any [`dim()`](Self::dim).
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] unless the panel is active.
    /// * [`OledError::Protocol`] if the command fails.
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), OledError> {
        self.ensure_ready()?;
        self.send_all(Operation::SetContrast, &[Command::Contrast(contrast)])?;
        self.contrast = contrast;
        self.dimmed = false;
        Ok(())
    }

    /// Drop contrast to zero, or restore the last contrast set.
    pub fn dim(&mut self, dim: bool) -> Result<(), OledError> {
        self.ensure_ready()?;
        let level = if dim { 0 } else { self.contrast };
        self.send_all(Operation::SetContrast, &[Command::Contrast(level)])?;
        self.dimmed = dim;
        Ok(())
    }

    /// Swap lit and unlit pixels in hardware. GDDRAM is untouched.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), OledError> {
        self.ensure_ready()?;
        self.send_all(Operation::SetInverted, &[Command::Invert(inverted)])?;
        self.inverted = inverted;
        Ok(())
    }

    /// Switch the GDDRAM addressing mode used for later flushes.
    ///
    /// # Errors
    ///
    /// [`OledError::Unsupported`] for anything but page mode on SH1106.
    pub fn set_addressing_mode(&mut self, mode: AddressingMode) -> Result<(), OledError> {
        self.ensure_ready()?;
        if !self.config.variant.supports_addressing_mode(mode) {
            return Err(OledError::Unsupported);
        }
        if self.config.variant == ControllerVariant::Ssd1306 {
            self.send_all(Operation::SetAddressingMode, &[Command::AddressMode(mode)])?;
        }
        self.addressing_mode = mode;
        Ok(())
    }

    /// Flip the panel. The COM direction changes immediately; the segment
    /// remap only applies to data written afterwards, so flush again.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), OledError> {
        self.ensure_ready()?;
        let (remap, reverse) = orientation(rotation);
        self.send_all(
            Operation::SetRotation,
            &[Command::SegmentRemap(remap), Command::ReverseComDir(reverse)],
        )?;
        self.rotation = rotation;
        Ok(())
    }

    // ── Scrolling ────────────────────────────────────────────────────

    /// Start a continuous hardware scroll over pages `start_page..=end_page`.
    ///
    /// # Errors
    ///
    /// * [`OledError::Unsupported`] on SH1106.
    /// * [`OledError::OutOfRange`] if the page range is empty or past the
    ///   last page.
    pub fn start_scroll(
        &mut self,
        direction: ScrollDirection,
        start_page: u8,
        end_page: u8,
    ) -> Result<(), OledError> {
        self.ensure_ready()?;
        if !self.config.variant.supports_scroll() {
            return Err(OledError::Unsupported);
        }
        if start_page > end_page || u32::from(end_page) >= self.config.pages() {
            return Err(OledError::OutOfRange);
        }

        let mut seq: Vec<Command, 4> = Vec::new();
        // Parameters may only change while scrolling is stopped.
        let _ = seq.push(Command::EnableScroll(false));
        if matches!(
            direction,
            ScrollDirection::DiagonalRight | ScrollDirection::DiagonalLeft
        ) {
            let _ = seq.push(Command::VerticalScrollArea(0, self.config.height as u8));
        }
        let _ = seq.push(Command::Scroll {
            direction,
            start_page,
            end_page,
        });
        let _ = seq.push(Command::EnableScroll(true));
        self.send_all(Operation::Scroll, &seq)?;
        self.scrolling = true;
        Ok(())
    }

    /// Stop hardware scrolling. GDDRAM content is undefined afterwards;
    /// flush again.
    pub fn stop_scroll(&mut self) -> Result<(), OledError> {
        self.ensure_ready()?;
        if !self.config.variant.supports_scroll() {
            return Err(OledError::Unsupported);
        }
        self.send_all(Operation::Scroll, &[Command::EnableScroll(false)])?;
        self.scrolling = false;
        Ok(())
    }

    // ── Addressing and data ──────────────────────────────────────────

    /// Select the GDDRAM region subsequent data lands in. Columns are
    /// visible columns; the panel's RAM offset is applied here.
    ///
    /// In page mode only the start pointer can be set; the end bounds are
    /// still validated.
    ///
    /// # Errors
    ///
    /// * [`OledError::OutOfRange`] unless `col_start <= col_end < width`
    ///   and `page_start <= page_end < pages`.
    /// * [`OledError::Protocol`] on a bus failure.
    pub fn set_address_window(
        &mut self,
        col_start: u8,
        col_end: u8,
        page_start: u8,
        page_end: u8,
    ) -> Result<(), OledError> {
        self.ensure_ready()?;
        self.check_window(col_start, col_end, page_start, page_end)?;
        let window = self.window_commands(col_start, col_end, page_start, page_end);
        self.send_all(Operation::SetAddressWindow, &window)?;
        Ok(())
    }

    /// Transfer framebuffer pages, page 0 first, in blocks no larger than
    /// the transport's [`max_transaction_size()`](Transport::max_transaction_size).
    ///
    /// Each page must be exactly `width` bytes and there may be at most
    /// `ceil(height / 8)` of them. Addressing is chosen per mode so the
    /// stored page order always reaches GDDRAM unchanged:
    ///
    /// * horizontal: one window over every page, then all data;
    /// * vertical: a one-page window per page, which makes the controller
    ///   advance column by column within that page;
    /// * page: page-start and column-start pointers per page.
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] while `Uninitialized` or `PoweredOff`.
    /// * [`OledError::OutOfRange`] on a page of the wrong length or too many
    ///   pages; nothing is sent.
    /// * [`OledError::Protocol`] on a bus failure, with the number of
    ///   transactions that landed.
    pub fn push_pages<'a, I>(&mut self, pages: I) -> Result<(), OledError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.ensure_ready()?;

        let width = self.config.width as usize;
        let mut blocks: Vec<&[u8], MAX_PAGES> = Vec::new();
        for page in pages {
            if page.len() != width || blocks.len() as u32 >= self.config.pages() {
                return Err(OledError::OutOfRange);
            }
            blocks.push(page).map_err(|_| OledError::OutOfRange)?;
        }
        if blocks.is_empty() {
            return Ok(());
        }

        let last_col = (width - 1) as u8;
        let chunk = self.transport.max_transaction_size().max(1);
        let mut sent = 0usize;

        if self.addressing_mode == AddressingMode::Horizontal {
            let last_page = (blocks.len() - 1) as u8;
            let window = self.window_commands(0, last_col, 0, last_page);
            self.send_counted(&window, &mut sent)?;
        }
        for (index, page) in blocks.iter().enumerate() {
            if self.addressing_mode != AddressingMode::Horizontal {
                let p = index as u8;
                let window = self.window_commands(0, last_col, p, p);
                self.send_counted(&window, &mut sent)?;
            }
            for block in page.chunks(chunk) {
                self.transport
                    .write_data_block(block)
                    .map_err(|e| ProtocolError::new(Operation::PushPages, sent, e))?;
                sent += 1;
            }
        }
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_ready(&self) -> Result<(), OledError> {
        match self.state {
            ControllerState::Uninitialized | ControllerState::PoweredOff => {
                Err(OledError::InvalidState { state: self.state })
            }
            ControllerState::Active | ControllerState::Sleeping => Ok(()),
        }
    }

    fn check_window(
        &self,
        col_start: u8,
        col_end: u8,
        page_start: u8,
        page_end: u8,
    ) -> Result<(), OledError> {
        if col_start > col_end
            || u32::from(col_end) >= self.config.width
            || page_start > page_end
            || u32::from(page_end) >= self.config.pages()
        {
            return Err(OledError::OutOfRange);
        }
        Ok(())
    }

    fn window_commands(
        &self,
        col_start: u8,
        col_end: u8,
        page_start: u8,
        page_end: u8,
    ) -> Vec<Command, 2> {
        let offset = self.config.effective_column_offset();
        let mut cmds: Vec<Command, 2> = Vec::new();
        match self.addressing_mode {
            AddressingMode::Horizontal | AddressingMode::Vertical => {
                let _ = cmds.push(Command::ColumnAddress(col_start + offset, col_end + offset));
                let _ = cmds.push(Command::PageAddress(page_start, page_end));
            }
            AddressingMode::Page => {
                let _ = cmds.push(Command::PageStart(page_start));
                let _ = cmds.push(Command::ColumnStart(col_start + offset));
            }
        }
        cmds
    }

    fn supply_command(&self, on: bool) -> Command {
        match self.config.variant {
            ControllerVariant::Ssd1306 => Command::ChargePump(on),
            ControllerVariant::Sh1106 => Command::DcDc(on),
        }
    }

    fn send(&mut self, cmd: Command) -> Result<(), TransportError> {
        self.transport.write_command_sequence(&cmd.encode())
    }

    /// Send commands in order; on failure report how many landed.
    fn send_all(&mut self, operation: Operation, cmds: &[Command]) -> Result<(), ProtocolError> {
        for (done, cmd) in cmds.iter().enumerate() {
            self.send(*cmd)
                .map_err(|e| ProtocolError::new(operation, done, e))?;
        }
        Ok(())
    }

    /// `send_all` for the push path, where the transaction count runs
    /// across commands and data blocks.
    fn send_counted(&mut self, cmds: &[Command], sent: &mut usize) -> Result<(), ProtocolError> {
        for cmd in cmds {
            self.send(*cmd)
                .map_err(|e| ProtocolError::new(Operation::PushPages, *sent, e))?;
            *sent += 1;
        }
        Ok(())
    }

    fn transition(&mut self, next: ControllerState) {
        if self.state != next {
            #[cfg(feature = "defmt")]
            defmt::debug!("OLED controller {} -> {}", self.state, next);
        }
        self.state = next;
    }
}

/// Segment remap and COM scan direction for a rotation.
fn orientation(rotation: Rotation) -> (bool, bool) {
    match rotation {
        Rotation::Rotate0 => (true, true),
        Rotation::Rotate180 => (false, false),
    }
}
