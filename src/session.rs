//! Display session: framebuffer + controller behind one API.

use embedded_hal::delay::DelayNs;

use crate::command::{AddressingMode, ScrollDirection};
use crate::config::{ControllerVariant, DisplayConfig, Rotation};
use crate::controller::{Controller, ControllerState};
use crate::error::OledError;
use crate::framebuffer::{Framebuffer, PixelValue};
use crate::primitive::Primitive;
use crate::transport::Transport;

/// A framebuffered OLED panel.
///
/// All drawing happens in RAM; nothing reaches the panel until
/// [`display()`](Self::display) (or an auto-flushing [`draw()`](Self::draw)).
///
/// # Lifecycle
///
/// 1. [`open()`](Self::open) / [`open_with_config()`](Self::open_with_config)
///    allocate the framebuffer. No bus traffic.
/// 2. [`begin()`](Self::begin) resets and initialises the controller.
/// 3. Draw, then [`display()`](Self::display).
/// 4. [`close()`](Self::close) powers the panel down and hands back the bus.
///
/// The session does no locking; share it between threads behind a mutex.
pub struct OledDisplay<T, D> {
    controller: Controller<T, D>,
    framebuffer: Framebuffer,
    auto_flush: bool,
}

impl<T, D> OledDisplay<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Open a session for a `width`×`height` panel with default settings.
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if the panel does not fit the controller.
    pub fn open(
        transport: T,
        delay: D,
        width: u32,
        height: u32,
        variant: ControllerVariant,
    ) -> Result<Self, OledError> {
        Self::open_with_config(transport, delay, DisplayConfig::new(width, height, variant))
    }

    /// # Errors
    ///
    /// Whatever [`DisplayConfig::validate`] reports.
    pub fn open_with_config(transport: T, delay: D, config: DisplayConfig) -> Result<Self, OledError> {
        let controller = Controller::new(transport, delay, config)?;
        let framebuffer = Framebuffer::new(config.width, config.height)?;
        Ok(Self {
            controller,
            framebuffer,
            auto_flush: config.auto_flush,
        })
    }

    /// Reset the controller and send the init sequence.
    ///
    /// Safe to call again after a failure; every attempt starts from a
    /// hardware reset. The framebuffer is left as it is.
    ///
    /// # Errors
    ///
    /// [`OledError::Initialization`] wrapping the failed step. The
    /// controller stays `Uninitialized`.
    pub fn begin(&mut self) -> Result<(), OledError> {
        self.controller
            .hardware_reset()
            .map_err(OledError::Initialization)?;
        self.controller
            .initialize()
            .map_err(OledError::Initialization)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "OLED initialised ({}x{})",
            self.framebuffer.width(),
            self.framebuffer.height()
        );
        Ok(())
    }

    /// Render `primitive` into the framebuffer, then flush if auto-flush
    /// is on.
    ///
    /// # Errors
    ///
    /// Only flush errors; drawing itself always succeeds (it clips).
    pub fn draw(&mut self, primitive: &Primitive<'_>) -> Result<(), OledError> {
        primitive.render(&mut self.framebuffer);
        if self.auto_flush {
            self.display()?;
        }
        Ok(())
    }

    /// Push the whole framebuffer to the panel.
    ///
    /// On failure the framebuffer is untouched, so the call can simply be
    /// repeated.
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] before [`begin()`](Self::begin) or
    ///   while powered off.
    /// * [`OledError::Protocol`] if the bus fails mid-transfer.
    pub fn display(&mut self) -> Result<(), OledError> {
        let result = self.controller.push_pages(self.framebuffer.as_pages());
        if let Err(ref _e) = result {
            #[cfg(feature = "defmt")]
            defmt::error!("OLED flush failed: {}", _e);
        }
        result
    }

    /// Power the panel down (best effort) and give back the bus and delay.
    pub fn close(mut self) -> (T, D) {
        if matches!(
            self.controller.state(),
            ControllerState::Active | ControllerState::Sleeping
        ) {
            if let Err(_e) = self.controller.set_power(false) {
                #[cfg(feature = "defmt")]
                defmt::warn!("OLED power-off on close failed: {}", _e);
            }
        }
        self.controller.release()
    }

    // ── Framebuffer ──────────────────────────────────────────────────

    /// Panel width in pixels.
    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    /// Panel height in pixels.
    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }

    /// The in-memory image the next flush will push.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Direct buffer access, e.g. as an `embedded-graphics` draw target.
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    /// Clear the framebuffer (not the panel).
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Apply `value` to every framebuffer pixel.
    pub fn fill(&mut self, value: PixelValue) {
        self.framebuffer.fill(value);
    }

    /// Whether [`draw()`](Self::draw) flushes on its own.
    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    /// Turn flushing after every [`draw()`](Self::draw) on or off.
    pub fn set_auto_flush(&mut self, auto_flush: bool) {
        self.auto_flush = auto_flush;
    }

    // ── Controller ───────────────────────────────────────────────────

    /// Controller lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// `true` once `begin()` has succeeded and the panel is on.
    pub fn is_active(&self) -> bool {
        self.controller.state() == ControllerState::Active
    }

    /// Configuration the session was opened with.
    pub fn config(&self) -> &DisplayConfig {
        self.controller.config()
    }

    /// Last contrast set on the panel.
    pub fn contrast(&self) -> u8 {
        self.controller.contrast()
    }

    /// Set the panel contrast.
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] unless the panel is active.
    /// * [`OledError::Protocol`] if the command fails.
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), OledError> {
        self.controller.set_contrast(contrast)
    }

    /// Drop contrast to zero, or restore it.
    pub fn dim(&mut self, dim: bool) -> Result<(), OledError> {
        self.controller.dim(dim)
    }

    /// Invert the panel in hardware; the framebuffer is unchanged.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), OledError> {
        self.controller.set_inverted(inverted)
    }

    /// Turn the panel and its charge pump on or off. GDDRAM is kept.
    ///
    /// # Errors
    ///
    /// [`OledError::InvalidState`] before [`begin()`](Self::begin).
    pub fn set_power(&mut self, on: bool) -> Result<(), OledError> {
        self.controller.set_power(on)
    }

    /// Enter sleep mode; [`wake()`](Self::wake) restores the panel.
    pub fn sleep(&mut self) -> Result<(), OledError> {
        self.controller.sleep()
    }

    /// Leave sleep mode.
    pub fn wake(&mut self) -> Result<(), OledError> {
        self.controller.wake()
    }

    /// # Errors
    ///
    /// [`OledError::Unsupported`] for anything but page mode on SH1106.
    pub fn set_addressing_mode(&mut self, mode: AddressingMode) -> Result<(), OledError> {
        self.controller.set_addressing_mode(mode)
    }

    /// Flip the panel and redraw the framebuffer in the new orientation.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), OledError> {
        self.controller.set_rotation(rotation)?;
        self.display()
    }

    /// Start a continuous hardware scroll over pages
    /// `start_page..=end_page` (SSD1306 only).
    ///
    /// # Errors
    ///
    /// * [`OledError::Unsupported`] on SH1106.
    /// * [`OledError::OutOfRange`] for an empty range or pages past the panel.
    pub fn start_scroll(
        &mut self,
        direction: ScrollDirection,
        start_page: u8,
        end_page: u8,
    ) -> Result<(), OledError> {
        self.controller.start_scroll(direction, start_page, end_page)
    }

    /// Stop scrolling and restore the panel from the framebuffer.
    pub fn stop_scroll(&mut self) -> Result<(), OledError> {
        self.controller.stop_scroll()?;
        self.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Operation;
    use crate::testing::{Event, NoopDelay, RecordingTransport};
    use embedded_graphics::geometry::{Point, Size};

    type TestDisplay = OledDisplay<RecordingTransport, NoopDelay>;

    fn open(width: u32, height: u32) -> TestDisplay {
        OledDisplay::open(
            RecordingTransport::new(),
            NoopDelay::default(),
            width,
            height,
            ControllerVariant::Ssd1306,
        )
        .unwrap()
    }

    fn bar() -> Primitive<'static> {
        Primitive::FilledRect {
            top_left: Point::new(2, 2),
            size: Size::new(4, 4),
            value: PixelValue::On,
        }
    }

    fn transport(display: &mut TestDisplay) -> &mut RecordingTransport {
        display.controller.transport_mut()
    }

    #[test]
    fn open_does_not_touch_the_bus() {
        let display = open(128, 64);
        assert_eq!(display.width(), 128);
        assert_eq!(display.height(), 64);
        assert!(!display.is_active());
        assert_eq!(display.state(), ControllerState::Uninitialized);
        let (transport, delay) = display.close();
        assert!(transport.events.is_empty());
        assert_eq!(delay.total_ns, 0);
    }

    #[test]
    fn open_rejects_unsupported_geometry() {
        let result = OledDisplay::open(
            RecordingTransport::new(),
            NoopDelay::default(),
            128,
            128,
            ControllerVariant::Ssd1306,
        );
        assert!(matches!(result, Err(OledError::OutOfRange)));
    }

    #[test]
    fn open_rejects_width_beyond_column_range() {
        let result = OledDisplay::open(
            RecordingTransport::new(),
            NoopDelay::default(),
            u32::MAX,
            64,
            ControllerVariant::Sh1106,
        );
        assert!(matches!(result, Err(OledError::OutOfRange)));
    }

    #[test]
    fn display_before_begin_is_invalid_state() {
        let mut display = open(128, 64);
        assert!(matches!(
            display.display(),
            Err(OledError::InvalidState {
                state: ControllerState::Uninitialized
            })
        ));
    }

    #[test]
    fn begin_resets_then_initialises() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        assert!(display.is_active());
        let t = transport(&mut display);
        assert_eq!(t.events[0], Event::Reset);
        assert_eq!(t.events[1], Event::Command(std::vec![0xAE]));
    }

    #[test]
    fn begin_then_display_pushes_framebuffer() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        display.draw(&bar()).unwrap();
        transport(&mut display).clear();

        display.display().unwrap();
        assert_eq!(display.state(), ControllerState::Active);

        let expected = display.framebuffer().as_bytes().to_vec();
        let t = transport(&mut display);
        assert_eq!(t.data_bytes(), expected);
        assert_eq!(expected[2], 0b0011_1100);
        assert!(t.data_blocks().iter().all(|b| b.len() <= 32));
    }

    #[test]
    fn drawing_stays_in_memory_until_display() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        transport(&mut display).clear();
        display.draw(&bar()).unwrap();
        assert!(transport(&mut display).events.is_empty());
    }

    #[test]
    fn auto_flush_pushes_after_draw() {
        let mut display = open(128, 32);
        display.set_auto_flush(true);
        display.begin().unwrap();
        transport(&mut display).clear();
        display.draw(&bar()).unwrap();
        assert_eq!(transport(&mut display).data_bytes().len(), 128 * 4);
    }

    #[test]
    fn failed_begin_stays_uninitialized_and_can_retry() {
        let mut display = open(128, 64);
        transport(&mut display).fail_from(3);
        match display.begin() {
            Err(OledError::Initialization(e)) => {
                assert_eq!(e.operation, Operation::Initialize);
                assert_eq!(e.completed, 2);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(display.state(), ControllerState::Uninitialized);
        assert!(matches!(
            display.display(),
            Err(OledError::InvalidState { .. })
        ));

        transport(&mut display).heal();
        display.begin().unwrap();
        assert!(display.is_active());
    }

    #[test]
    fn failed_reset_is_an_initialization_error() {
        let mut display = open(128, 64);
        transport(&mut display).fail_from(0);
        match display.begin() {
            Err(OledError::Initialization(e)) => assert_eq!(e.operation, Operation::Reset),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn failed_display_keeps_framebuffer_for_retry() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        display.draw(&bar()).unwrap();
        let snapshot = display.framebuffer().clone();

        transport(&mut display).fail_from(5);
        assert!(matches!(display.display(), Err(OledError::Protocol(_))));
        assert_eq!(display.framebuffer(), &snapshot);
        assert!(display.is_active());

        transport(&mut display).heal();
        transport(&mut display).clear();
        display.display().unwrap();
        assert_eq!(transport(&mut display).data_bytes(), snapshot.as_bytes());
    }

    #[test]
    fn close_powers_down() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        transport(&mut display).clear();
        let (transport, _delay) = display.close();
        assert_eq!(transport.command_bytes(), [0xAE, 0x8D, 0x10]);
    }

    #[test]
    fn close_swallows_power_off_failure() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        transport(&mut display).fail_from(0);
        let before = transport(&mut display).events.len();
        let (transport, _delay) = display.close();
        assert_eq!(transport.events.len(), before);
    }

    #[test]
    fn sh1106_session_flushes_page_by_page() {
        let mut display = OledDisplay::open(
            RecordingTransport::new(),
            NoopDelay::default(),
            128,
            64,
            ControllerVariant::Sh1106,
        )
        .unwrap();
        display.begin().unwrap();
        transport(&mut display).clear();
        display.display().unwrap();

        let t = transport(&mut display);
        let page_starts: std::vec::Vec<u8> = t
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Command(bytes) if bytes.len() == 1 && bytes[0] & 0xF0 == 0xB0 => {
                    Some(bytes[0])
                }
                _ => None,
            })
            .collect();
        assert_eq!(page_starts, (0xB0..=0xB7).collect::<std::vec::Vec<u8>>());
        assert_eq!(t.data_bytes().len(), 128 * 8);
    }

    #[test]
    fn stop_scroll_restores_from_framebuffer() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        display
            .start_scroll(ScrollDirection::Right, 0, 7)
            .unwrap();
        transport(&mut display).clear();
        display.stop_scroll().unwrap();
        let t = transport(&mut display);
        assert_eq!(t.events[0], Event::Command(std::vec![0x2E]));
        assert_eq!(t.data_bytes().len(), 128 * 8);
    }

    #[test]
    fn sleep_and_power_pass_through() {
        let mut display = open(128, 64);
        display.begin().unwrap();
        display.sleep().unwrap();
        assert_eq!(display.state(), ControllerState::Sleeping);
        display.display().unwrap();
        display.set_power(false).unwrap();
        assert_eq!(display.state(), ControllerState::PoweredOff);
        assert!(display.display().is_err());
        display.set_power(true).unwrap();
        assert!(display.is_active());
    }
}
