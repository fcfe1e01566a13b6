/*!
# RF Transmitter

Sends 24-bit codes over a 433 MHz on-off-keyed transmitter wired to one GPIO
line. The line is toggled with precisely timed high/low pulses; the RF module
handles the carrier.

## Pipeline

integer code -> 24-bit string -> ZERO/ONE symbols + SYNC -> timed pulses,
repeated 10 times.

## Modules

- [`line`] - Digital output lines and backend selection
- [`board`] - Board pin tables and GPIO mappings
- [`waiter`] - Spin and sleep waiting strategies
- [`pulse`] - Pulse primitive and symbol encoder
- [`transmitter`] - Frame transmitter with cancellation
- [`command`] - Key/value command dispatch
- [`config`] - TOML configuration and transmitter construction
- [`server`] - UDP JSON command endpoint
*/

pub mod board;
pub mod command;
pub mod config;
pub mod error;
pub mod line;
pub mod pulse;
pub mod server;
pub mod transmitter;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use board::{Board, BoardRegistry, GpioMapping, MappedBoard};
pub use command::{dispatch, respond, Command, CommandMap};
pub use config::AppConfig;
pub use error::{CommandError, ConfigError, LineError, TransmitError};
pub use line::{DirectLine, LineBackend, OutputLine};
pub use transmitter::{CancelToken, TransmitReport, Transmitter};
pub use waiter::{PrecisionWaiter, SleepWaiter, SpinWaiter, WaiterKind};
