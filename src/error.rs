//! Our error types for the XPF PSU control core.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Transport level failure while talking to the PSU.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error: {0}")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Frame does not fit in buffer")]
    BufferOverflow,
}

/// Failure while loading a [`TransportConfig`](crate::config::TransportConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration field: {0}")]
    Missing(&'static str),
    #[error("Invalid baud rate")]
    InvalidBaudRate,
    #[error("Invalid parity, expected N, O or E")]
    InvalidParity,
    #[error("Invalid data bits, expected 5 to 8")]
    InvalidDataBits,
    #[error("Invalid stop bits, expected 1, 1.5 or 2")]
    InvalidStopBits,
    #[error("Invalid read timeout")]
    InvalidTimeout,
    #[error("Port name too long")]
    PortTooLong,
}

/// Caller supplied an argument the PSU session can't act on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("Unknown channel")]
    UnknownChannel,
    #[error("Unknown load model")]
    UnknownModel,
    #[error("Unknown reset target")]
    UnknownResetTarget,
}

impl<I: embedded_io::Error> From<core::fmt::Error> for Error<I> {
    fn from(_: core::fmt::Error) -> Self {
        Error::BufferOverflow
    }
}
