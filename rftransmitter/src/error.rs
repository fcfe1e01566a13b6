/*!
Error types for the transmitter: line, configuration, transmission and command errors.
*/

use shared::CodeError;
use thiserror::Error;

/// Boxed error source carried by line failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A digital output line failed to open or change state
///
/// Always carries the identity of the device and line so failures can be
/// attributed to a specific pin.
#[derive(Error, Debug)]
#[error("GPIO device {device} line {offset}: {source}")]
pub struct LineError {
    pub device: String,
    pub offset: u32,
    pub source: BoxError,
}

impl LineError {
    pub fn new(device: impl Into<String>, offset: u32, source: impl Into<BoxError>) -> Self {
        Self {
            device: device.into(),
            offset,
            source: source.into(),
        }
    }
}

/// Errors detected while building a transmitter; no transmitter is created
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("pulse_length must be a positive integer number of microseconds, got {0:?}")]
    InvalidPulseLength(String),

    #[error("unknown board {0:?}")]
    UnknownBoard(String),

    #[error("data pin {pin:?} is not available on board {board:?}")]
    InvalidPin { board: String, pin: String },

    #[error("failed to open data pin: {0}")]
    Line(#[from] LineError),
}

/// Errors that abort an in-progress transmission
#[derive(Error, Debug)]
pub enum TransmitError {
    #[error("line error: {0}")]
    Line(#[from] LineError),

    #[error("transmission cancelled after {emitted} symbols")]
    Cancelled { emitted: usize },
}

/// Errors returned by the command dispatcher
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("command is required")]
    MissingCommand,

    #[error("unsupported command {0:?}")]
    UnsupportedCommand(String),

    #[error("code is required")]
    MissingCode,

    #[error("code must be an integer, got {0}")]
    InvalidCode(String),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Transmit(#[from] TransmitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_identifies_device() {
        let err = LineError::new("/dev/gpiochip0", 17, "device busy");
        assert_eq!(err.to_string(), "GPIO device /dev/gpiochip0 line 17: device busy");
    }

    #[test]
    fn test_transmit_error_wraps_line_error() {
        let err: TransmitError = LineError::new("/dev/gpiochip1", 4, "io").into();
        let message = err.to_string();
        assert!(message.contains("/dev/gpiochip1"));
        assert!(message.contains("line 4"));
    }
}
