/*!
Common error types for the RF transmitter components.
*/

use thiserror::Error;

/// Errors raised while validating a transmission code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// Rejected value, wide enough for any signed or unsigned 64-bit input
    #[error("code {0} is outside the 24-bit range 0..=16777215")]
    OutOfRange(i128),

    #[error("could not parse {0:?} as a base-10 integer code")]
    Parse(String),
}
