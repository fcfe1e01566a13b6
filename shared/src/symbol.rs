/*!
Protocol symbols and their pulse-duration ratios.

Every symbol on the air is one high phase followed by one low phase. The
length of each phase is expressed in pulse-length units; the transmitter
scales units into real time with its configured pulse length.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three symbols of the on-off-keyed wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    /// Data bit 0: short high, long low
    Zero,
    /// Data bit 1: long high, short low
    One,
    /// Frame boundary, emitted once after every repetition
    Sync,
}

impl Symbol {
    /// Map a data bit to its symbol
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Self::One
        } else {
            Self::Zero
        }
    }

    /// Fixed high/low ratio for this symbol
    pub const fn ratio(self) -> PulseRatio {
        match self {
            Self::Zero => PulseRatio::new(1, 3),
            Self::One => PulseRatio::new(3, 1),
            Self::Sync => PulseRatio::new(1, 31),
        }
    }

    /// Check if this symbol carries a data bit
    pub fn is_data(self) -> bool {
        !matches!(self, Self::Sync)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zero => "ZERO",
            Self::One => "ONE",
            Self::Sync => "SYNC",
        };
        f.pad(name)
    }
}

/// High and low phase lengths in pulse-length units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseRatio {
    pub high_units: u32,
    pub low_units: u32,
}

impl PulseRatio {
    pub const fn new(high_units: u32, low_units: u32) -> Self {
        Self { high_units, low_units }
    }

    /// Total units the symbol occupies on the air
    pub const fn total_units(self) -> u32 {
        self.high_units + self.low_units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_ratios() {
        assert_eq!(Symbol::Zero.ratio(), PulseRatio::new(1, 3));
        assert_eq!(Symbol::One.ratio(), PulseRatio::new(3, 1));
        assert_eq!(Symbol::Sync.ratio(), PulseRatio::new(1, 31));
    }

    #[test]
    fn test_data_symbols_share_period() {
        // Zero and One only differ in duty cycle
        assert_eq!(Symbol::Zero.ratio().total_units(), 4);
        assert_eq!(Symbol::One.ratio().total_units(), 4);
        assert_eq!(Symbol::Sync.ratio().total_units(), 32);
    }

    #[test]
    fn test_from_bit() {
        assert_eq!(Symbol::from_bit(true), Symbol::One);
        assert_eq!(Symbol::from_bit(false), Symbol::Zero);
        assert!(Symbol::One.is_data());
        assert!(!Symbol::Sync.is_data());
    }

    #[test]
    fn test_symbol_serialization() {
        let json = serde_json::to_string(&Symbol::Sync).unwrap();
        assert_eq!(json, "\"sync\"");
        assert_eq!(format!("{:<5}|", Symbol::One), "ONE  |");
    }
}
