//! Bus Transport: the command/data write primitives the controller driver
//! is built on.
//!
//! The driver never touches pins or bus registers directly. Anything that
//! implements [`Transport`] can carry the controller protocol:
//!
//! - [`InterfaceTransport`] adapts any `display-interface`
//!   [`WriteOnlyDataCommand`], including the stock I2C interface.
//! - [`SpiTransport`] drives a 4-wire SPI bus with a D/C line.

use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};
use display_interface_i2c::I2CInterface;
use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c, spi::SpiDevice};

use crate::error::TransportError;

/// Largest data block issued in one I2C transaction.
///
/// Many SBC I2C drivers cap a single write at 32 bytes including the
/// control byte.
pub const I2C_MAX_TRANSACTION: usize = 31;

/// Largest data block issued in one SPI transaction.
pub const SPI_MAX_TRANSACTION: usize = 4096;

/// Default I2C address of SSD1306/SH1106 modules (`0x3D` on some boards).
pub const DEFAULT_I2C_ADDRESS: u8 = 0x3C;

/// I2C control byte announcing a data stream.
const I2C_DATA_CONTROL: u8 = 0x40;

/// Serial command/data channel to an OLED controller.
///
/// All calls block until the bus transaction completes.
pub trait Transport {
    /// Send a single command byte.
    fn write_command(&mut self, byte: u8) -> Result<(), TransportError> {
        self.write_command_sequence(&[byte])
    }

    /// Send an opcode and its argument bytes as one command transaction.
    fn write_command_sequence(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Send one block of GDDRAM data.
    ///
    /// Callers keep blocks at or below [`max_transaction_size()`](Self::max_transaction_size).
    fn write_data_block(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Pulse the controller's hardware reset line, if there is one.
    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Bus-imposed maximum data block length in bytes.
    fn max_transaction_size(&self) -> usize {
        I2C_MAX_TRANSACTION
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_command(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_command(byte)
    }

    fn write_command_sequence(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_command_sequence(bytes)
    }

    fn write_data_block(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_data_block(bytes)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }

    fn max_transaction_size(&self) -> usize {
        (**self).max_transaction_size()
    }
}

// ── Reset line ───────────────────────────────────────────────────────────

/// A hardware reset line.
pub trait ResetLine {
    /// Drive the reset sequence.
    fn pulse(&mut self) -> Result<(), TransportError>;
}

/// No reset line wired (typical for 4-pin I2C modules).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReset;

impl ResetLine for NoReset {
    fn pulse(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Active-low reset pin with its own delay source.
pub struct ResetPin<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> ResetPin<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Drive reset pulses on `pin`, timed with `delay`.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Give back the pin and delay.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D> ResetLine for ResetPin<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// High 1 ms, low 10 ms, high.
    fn pulse(&mut self) -> Result<(), TransportError> {
        self.pin.set_high().map_err(|_| DisplayError::RSError)?;
        self.delay.delay_ms(1);
        self.pin.set_low().map_err(|_| DisplayError::RSError)?;
        self.delay.delay_ms(10);
        self.pin.set_high().map_err(|_| DisplayError::RSError)
    }
}

// ── display-interface adapter ────────────────────────────────────────────

/// [`Transport`] over any `display-interface` [`WriteOnlyDataCommand`].
///
/// # Example
///
/// ```no_run
/// use pi_oled_display_rs::transport::{InterfaceTransport, DEFAULT_I2C_ADDRESS};
///
/// # fn example(i2c: impl embedded_hal::i2c::I2c) {
/// let transport = InterfaceTransport::i2c(i2c, DEFAULT_I2C_ADDRESS);
/// # }
/// ```
pub struct InterfaceTransport<DI, R = NoReset> {
    interface: DI,
    reset: R,
    max_transaction: usize,
}

impl<I2C> InterfaceTransport<I2CInterface<I2C>, NoReset>
where
    I2C: I2c,
{
    /// I2C transport for the module at the given 7-bit address.
    pub fn i2c(i2c: I2C, address: u8) -> Self {
        Self::new(
            I2CInterface::new(i2c, address, I2C_DATA_CONTROL),
            I2C_MAX_TRANSACTION,
        )
    }
}

impl<DI> InterfaceTransport<DI, NoReset>
where
    DI: WriteOnlyDataCommand,
{
    /// Wrap an interface; data blocks are capped at `max_transaction` bytes.
    pub fn new(interface: DI, max_transaction: usize) -> Self {
        Self {
            interface,
            reset: NoReset,
            max_transaction: max_transaction.max(1),
        }
    }
}

impl<DI, R> InterfaceTransport<DI, R>
where
    DI: WriteOnlyDataCommand,
    R: ResetLine,
{
    /// Attach a hardware reset line.
    pub fn with_reset<R2: ResetLine>(self, reset: R2) -> InterfaceTransport<DI, R2> {
        InterfaceTransport {
            interface: self.interface,
            reset,
            max_transaction: self.max_transaction,
        }
    }

    /// Give back the interface and reset line.
    pub fn release(self) -> (DI, R) {
        (self.interface, self.reset)
    }
}

impl<DI, R> Transport for InterfaceTransport<DI, R>
where
    DI: WriteOnlyDataCommand,
    R: ResetLine,
{
    fn write_command_sequence(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.interface.send_commands(DataFormat::U8(bytes))
    }

    fn write_data_block(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.interface.send_data(DataFormat::U8(bytes))
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.reset.pulse()
    }

    fn max_transaction_size(&self) -> usize {
        self.max_transaction
    }
}

// ── SPI ──────────────────────────────────────────────────────────────────

/// 4-wire SPI transport: D/C low for commands, high for data.
///
/// Chip select is handled by the [`SpiDevice`] implementation.
pub struct SpiTransport<SPI, DC, R = NoReset> {
    spi: SPI,
    dc: DC,
    reset: R,
}

impl<SPI, DC> SpiTransport<SPI, DC, NoReset>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    /// 4-wire SPI transport with `dc` low for commands, high for data.
    /// No reset line until [`with_reset()`](SpiTransport::with_reset).
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self {
            spi,
            dc,
            reset: NoReset,
        }
    }
}

impl<SPI, DC, R> SpiTransport<SPI, DC, R>
where
    SPI: SpiDevice,
    DC: OutputPin,
    R: ResetLine,
{
    /// Attach a hardware reset line.
    pub fn with_reset<R2: ResetLine>(self, reset: R2) -> SpiTransport<SPI, DC, R2> {
        SpiTransport {
            spi: self.spi,
            dc: self.dc,
            reset,
        }
    }

    /// Give back the bus, D/C pin and reset line.
    pub fn release(self) -> (SPI, DC, R) {
        (self.spi, self.dc, self.reset)
    }
}

impl<SPI, DC, R> Transport for SpiTransport<SPI, DC, R>
where
    SPI: SpiDevice,
    DC: OutputPin,
    R: ResetLine,
{
    fn write_command_sequence(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.dc.set_low().map_err(|_| DisplayError::DCError)?;
        self.spi.write(bytes).map_err(|_| DisplayError::BusWriteError)
    }

    fn write_data_block(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.dc.set_high().map_err(|_| DisplayError::DCError)?;
        self.spi.write(bytes).map_err(|_| DisplayError::BusWriteError)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.reset.pulse()
    }

    fn max_transaction_size(&self) -> usize {
        SPI_MAX_TRANSACTION
    }
}
