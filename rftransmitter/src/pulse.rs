/*!
Pulse primitive and symbol encoder.

A pulse drives the line high for `high_units` pulse lengths, then low for
`low_units` pulse lengths. Symbols are pulses with the fixed ratios from
[`Symbol::ratio`].
*/

use shared::Symbol;
use std::time::Duration;

use crate::error::LineError;
use crate::line::OutputLine;
use crate::waiter::PrecisionWaiter;

/// Emits timed pulses on one line
pub struct PulseEmitter<'a> {
    line: &'a dyn OutputLine,
    waiter: &'a dyn PrecisionWaiter,
    pulse_length: Duration,
}

impl<'a> PulseEmitter<'a> {
    pub fn new(line: &'a dyn OutputLine, waiter: &'a dyn PrecisionWaiter, pulse_length: Duration) -> Self {
        Self {
            line,
            waiter,
            pulse_length,
        }
    }

    /// High for `high_units`, then low for `low_units`
    ///
    /// A failure to raise the line returns before the low phase.
    pub fn emit_pulse(&self, high_units: u32, low_units: u32) -> Result<(), LineError> {
        self.line.set(true)?;
        self.waiter.wait(self.pulse_length * high_units);
        self.line.set(false)?;
        self.waiter.wait(self.pulse_length * low_units);
        Ok(())
    }

    pub fn emit_symbol(&self, symbol: Symbol) -> Result<(), LineError> {
        let ratio = symbol.ratio();
        self.emit_pulse(ratio.high_units, ratio.low_units)
    }
}
