/*!
Transmission codes and their fixed-width binary framing.

A code is rendered as 24 bits, most-significant bit first. Each bit becomes
one data symbol, and a SYNC symbol closes every repetition of the frame.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CodeError;
use crate::protocol::{CODE_BITS, MAX_CODE};
use crate::symbol::Symbol;

/// A payload code in the range `0..2^24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Code(u32);

impl Code {
    /// Validate a raw integer as a code
    ///
    /// Negative values and values wider than 24 bits are rejected rather
    /// than truncated.
    pub fn new(value: i64) -> Result<Self, CodeError> {
        if (0..=MAX_CODE as i64).contains(&value) {
            Ok(Self(value as u32))
        } else {
            Err(CodeError::OutOfRange(value.into()))
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Render as a 24-character binary string, MSB first
    pub fn render(self) -> String {
        format!("{:0width$b}", self.0, width = CODE_BITS)
    }

    /// Iterate over the 24 bits, MSB first
    pub fn bits(self) -> impl Iterator<Item = bool> {
        let value = self.0;
        (0..CODE_BITS).rev().map(move |shift| (value >> shift) & 1 == 1)
    }

    /// Symbols for one repetition: 24 data symbols followed by SYNC
    pub fn frame(self) -> impl Iterator<Item = Symbol> {
        self.bits()
            .map(Symbol::from_bit)
            .chain(std::iter::once(Symbol::Sync))
    }
}

impl TryFrom<i64> for Code {
    type Error = CodeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Code> for u32 {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| CodeError::Parse(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SYMBOLS_PER_REPETITION;

    #[test]
    fn test_render_small_code() {
        let code = Code::new(5).unwrap();
        assert_eq!(code.render(), "000000000000000000000101");
    }

    #[test]
    fn test_render_is_fixed_width_and_reversible() {
        for value in [0i64, 1, 2, 5, 0x5555, 0xABCDEF, 1 << 23, MAX_CODE as i64] {
            let rendered = Code::new(value).unwrap().render();
            assert_eq!(rendered.len(), CODE_BITS);
            assert!(rendered.chars().all(|c| c == '0' || c == '1'));
            assert_eq!(i64::from_str_radix(&rendered, 2).unwrap(), value);
        }
    }

    #[test]
    fn test_bits_match_render() {
        let code = Code::new(0xA5A5A5).unwrap();
        let from_bits: String = code.bits().map(|b| if b { '1' } else { '0' }).collect();
        assert_eq!(from_bits, code.render());
    }

    #[test]
    fn test_frame_ends_with_sync() {
        let symbols: Vec<Symbol> = Code::new(5).unwrap().frame().collect();
        assert_eq!(symbols.len(), SYMBOLS_PER_REPETITION);
        assert!(symbols[..21].iter().all(|s| *s == Symbol::Zero));
        assert_eq!(&symbols[21..], &[Symbol::One, Symbol::Zero, Symbol::One, Symbol::Sync]);
    }

    #[test]
    fn test_zero_code_frame() {
        let symbols: Vec<Symbol> = Code::new(0).unwrap().frame().collect();
        assert_eq!(symbols.iter().filter(|s| **s == Symbol::Zero).count(), 24);
        assert_eq!(symbols.last(), Some(&Symbol::Sync));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(Code::new(-1), Err(CodeError::OutOfRange(-1)));
        assert_eq!(Code::new(1 << 24), Err(CodeError::OutOfRange(1 << 24)));
        assert!(Code::new(MAX_CODE as i64).is_ok());
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!("42".parse::<Code>().unwrap().value(), 42);
        assert_eq!(" 7 ".parse::<Code>().unwrap().value(), 7);
        assert!(matches!("abc".parse::<Code>(), Err(CodeError::Parse(_))));
        assert!(matches!("-3".parse::<Code>(), Err(CodeError::OutOfRange(-3))));
    }

    #[test]
    fn test_serde_validates_range() {
        let code: Code = serde_json::from_str("1361").unwrap();
        assert_eq!(code.value(), 1361);
        assert!(serde_json::from_str::<Code>("-1").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "1361");
    }
}
