//! Error types for the OLED display driver.

use core::fmt;

use display_interface::DisplayError;

use crate::controller::ControllerState;

/// Bus-level failure reported by a [`Transport`](crate::transport::Transport).
///
/// The `display-interface` crates already fold every I2C, SPI and GPIO
/// failure into [`DisplayError`], so transports share that type.
pub type TransportError = DisplayError;

/// The controller operation that was in flight when a transport write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// Hardware reset pulse.
    Reset,
    /// Power-up command sequence.
    Initialize,
    /// Column/page window selection.
    SetAddressWindow,
    /// Framebuffer transfer.
    PushPages,
    /// Display on/off or charge pump switching.
    SetPower,
    SetContrast,
    SetInverted,
    SetAddressingMode,
    SetRotation,
    Scroll,
}

/// A controller command sequence failed partway.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// Operation that failed.
    pub operation: Operation,
    /// Number of commands or data blocks the bus accepted before the failure.
    pub completed: usize,
    /// Underlying bus failure.
    pub source: TransportError,
}

impl ProtocolError {
    pub(crate) fn new(operation: Operation, completed: usize, source: TransportError) -> Self {
        Self {
            operation,
            completed,
            source,
        }
    }
}

/// Errors that can occur during OLED display operations.
///
/// Non-generic: every bus failure arrives as a [`TransportError`].
#[derive(Debug, Clone)]
pub enum OledError {
    /// Raw bus failure outside of a controller command sequence.
    Transport(TransportError),
    /// A controller command sequence failed partway.
    Protocol(ProtocolError),
    /// The operation is not legal in the current controller state.
    InvalidState {
        /// State the controller was in when the call was rejected.
        state: ControllerState,
    },
    /// Coordinates, dimensions or an addressing window fall outside the
    /// framebuffer.
    OutOfRange,
    /// [`begin()`](crate::OledDisplay::begin) failed; the controller remains
    /// uninitialised.
    Initialization(ProtocolError),
    /// The selected controller variant has no such command.
    Unsupported,
}

impl From<DisplayError> for OledError {
    fn from(e: DisplayError) -> Self {
        OledError::Transport(e)
    }
}

impl From<ProtocolError> for OledError {
    fn from(e: ProtocolError) -> Self {
        OledError::Protocol(e)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} failed after {} transaction(s): {:?}",
            self.operation, self.completed, self.source
        )
    }
}

impl fmt::Display for OledError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OledError::Transport(e) => write!(f, "Transport error: {:?}", e),
            OledError::Protocol(e) => write!(f, "Protocol error: {}", e),
            OledError::InvalidState { state } => {
                write!(f, "Operation not allowed in state {:?}", state)
            }
            OledError::OutOfRange => write!(f, "Out of range"),
            OledError::Initialization(e) => write!(f, "Initialization failed: {}", e),
            OledError::Unsupported => write!(f, "Unsupported by controller variant"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProtocolError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} failed after {} transaction(s)",
            self.operation,
            self.completed
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for OledError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::Transport(_e) => defmt::write!(f, "Transport error"),
            OledError::Protocol(e) => defmt::write!(f, "Protocol error: {}", e),
            OledError::InvalidState { state } => defmt::write!(f, "Invalid state: {}", state),
            OledError::OutOfRange => defmt::write!(f, "Out of range"),
            OledError::Initialization(e) => defmt::write!(f, "Initialization failed: {}", e),
            OledError::Unsupported => defmt::write!(f, "Unsupported"),
        }
    }
}
