//! Our error types for the Inspire hand.

use thiserror::Error;

use crate::{
    joint::{Joint, JointKind},
    register::{Generation, Register},
};

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Errors raised while validating a request, before anything is sent to the hand.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("{kind} value {value} for {joint} is outside {min}..={max}")]
    OutOfRange {
        kind: JointKind,
        joint: Joint,
        value: i32,
        min: u16,
        max: u16,
    },
    #[error("Expected 6 joint values, got {0}")]
    WrongLength(usize),
    #[error("Hand id {0} is outside 1..=254")]
    InvalidHandId(u8),
    #[error("Hardware generation {0} is not supported")]
    UnsupportedGeneration(u8),
    #[error("Register {register} is not available on generation {generation}")]
    Unmapped {
        register: Register,
        generation: Generation,
    },
    #[error("Register {0} cannot be accessed this way")]
    LayoutMismatch(Register),
    #[error("No action sequence has been selected in this session")]
    NoActionSequence,
}

/// Custom error type for Inspire hand communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Failed to open connection")]
    Connection(I),
    #[error("Transport I/O error")]
    Io(I),
    #[error("Modbus protocol error: {0}")]
    ModbusError(rmodbus::ErrorKind),
    #[error("Communication timeout")]
    Timeout,
    #[error("Connection closed by peer")]
    Disconnected,
    #[error("Transport has been closed")]
    NotConnected,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },
    #[error("Short read: expected {expected} registers, got {actual}")]
    ShortRead { expected: usize, actual: usize },
    #[error("Device rejected write to {address} with status {status:#04x}")]
    Rejected { address: u16, status: u8 },
    #[error("Frame does not fit in the transmit buffer")]
    BufferError,
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Error<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        Error::ModbusError(err)
    }
}

/// Coarse classification of [`Error`], used by callers that only care which family of
/// failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input, rejected before any I/O.
    Range,
    /// The generation, or the register for this generation, is not supported.
    UnsupportedGeneration,
    /// The transport could not be opened.
    Connection,
    /// The transaction failed in flight.
    Transport,
    /// The session is not in a state where the operation is allowed.
    Precondition,
}

impl RequestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OutOfRange { .. } | Self::WrongLength(_) | Self::InvalidHandId(_) => {
                ErrorCategory::Range
            }
            Self::UnsupportedGeneration(_) | Self::Unmapped { .. } | Self::LayoutMismatch(_) => {
                ErrorCategory::UnsupportedGeneration
            }
            Self::NoActionSequence => ErrorCategory::Precondition,
        }
    }
}

impl<I: embedded_io::Error> Error<I> {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Request(req) => req.category(),
            Self::Connection(_) => ErrorCategory::Connection,
            _ => ErrorCategory::Transport,
        }
    }

    /// Whether this error happened while a transaction was in flight.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    /// Whether the link is gone and the transport should be closed.
    ///
    /// Timeouts and bad frames are not fatal; the next request may succeed.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Disconnected | Self::NotConnected => true,
            Self::Io(err) => matches!(
                err.kind(),
                embedded_io::ErrorKind::ConnectionReset
                    | embedded_io::ErrorKind::ConnectionAborted
                    | embedded_io::ErrorKind::BrokenPipe
                    | embedded_io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }

    /// Map an I/O error from a read, treating timeouts as [`Error::Timeout`].
    pub(crate) fn from_io(err: I) -> Self {
        match err.kind() {
            embedded_io::ErrorKind::TimedOut => Error::Timeout,
            embedded_io::ErrorKind::NotConnected => Error::NotConnected,
            _ => Error::Io(err),
        }
    }
}
