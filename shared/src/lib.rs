/*!
# Shared Protocol Types

This crate contains the hardware-independent half of the 433 MHz on-off-keyed
RF transmitter: symbols, their timing ratios, and the framing of integer codes.

## Core Types

- [`Symbol`] - ZERO, ONE and SYNC protocol symbols
- [`PulseRatio`] - High/low phase lengths in pulse-length units
- [`Code`] - Validated 24-bit payload code

## Modules

- [`symbol`] - Symbol to pulse-ratio mapping
- [`code`] - Code validation and binary framing
- [`error`] - Common error types
*/

pub mod code;
pub mod error;
pub mod symbol;

// Re-export commonly used types
pub use code::Code;
pub use error::CodeError;
pub use symbol::{PulseRatio, Symbol};

/// Version information for the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// Width of a code on the air in bits
    pub const CODE_BITS: usize = 24;

    /// Largest code that fits in a frame
    pub const MAX_CODE: u32 = (1 << CODE_BITS) - 1;

    /// Repetitions of the frame per transmission
    pub const TX_REPEAT: usize = 10;

    /// Symbols per repetition: one per bit plus the trailing SYNC
    pub const SYMBOLS_PER_REPETITION: usize = CODE_BITS + 1;

    /// Symbols emitted by a complete transmission
    pub const SYMBOLS_PER_TRANSMISSION: usize = TX_REPEAT * SYMBOLS_PER_REPETITION;

    /// Default pulse length in microseconds
    pub const DEFAULT_PULSE_LENGTH_US: u64 = 350;

    /// Line offset sentinel meaning "no such pin"
    pub const NO_PIN: u32 = 0xFFFF_FFFF;

    /// Consumer label attached to requested GPIO lines
    pub const LINE_CONSUMER: &str = "rftransmitter";
}
