/*!
Digital output lines.

[`OutputLine`] is the single capability the transmitter needs: drive a line
high or low. [`DirectLine`] holds a Linux GPIO character-device line open for
its whole lifetime; [`LineBackend`] selects between an owned line and a line
looked up from a board on every transmission.
*/

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use shared::protocol::LINE_CONSUMER;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::board::{Board, GpioMapping};
use crate::error::{ConfigError, LineError};
use crate::waiter::WaiterKind;

/// A line that can be driven high or low
pub trait OutputLine: Send + Sync {
    fn set(&self, high: bool) -> Result<(), LineError>;
}

/// GPIO line requested in output mode from a character device
pub struct DirectLine {
    mapping: GpioMapping,
    handle: Mutex<LineHandle>,
}

impl DirectLine {
    /// Open the mapped line as an output, initially low
    ///
    /// The sentinel mapping is rejected before any device is touched.
    pub fn open(mapping: GpioMapping) -> Result<Self, LineError> {
        if mapping.is_none() {
            return Err(mapping.line_error("data pin invalid"));
        }

        let mut chip = Chip::new(&mapping.chip).map_err(|e| mapping.line_error(e))?;
        let handle = chip
            .get_line(mapping.line)
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, 0, LINE_CONSUMER))
            .map_err(|e| mapping.line_error(e))?;

        info!("🔌 Opened GPIO device {} line {} as output", mapping.chip, mapping.line);
        Ok(Self {
            mapping,
            handle: Mutex::new(handle),
        })
    }

    pub fn mapping(&self) -> &GpioMapping {
        &self.mapping
    }
}

impl OutputLine for DirectLine {
    fn set(&self, high: bool) -> Result<(), LineError> {
        let handle = self
            .handle
            .lock()
            .map_err(|_| self.mapping.line_error("line lock poisoned"))?;
        handle
            .set_value(u8::from(high))
            .map_err(|e| self.mapping.line_error(e))
    }
}

impl Drop for DirectLine {
    fn drop(&mut self) {
        debug!("Releasing GPIO device {} line {}", self.mapping.chip, self.mapping.line);
    }
}

/// Where a transmitter gets its line from
pub enum LineBackend {
    /// A line held open for the transmitter's lifetime
    Owned(Box<dyn OutputLine>),
    /// A pin looked up on the board at the start of every transmission
    Board { board: Arc<dyn Board>, pin: String },
}

impl LineBackend {
    /// Board-backed line; fails if the board has no such pin
    pub fn board(board: Arc<dyn Board>, pin: impl Into<String>) -> Result<Self, ConfigError> {
        let pin = pin.into();
        if board.gpio_mapping(&pin).is_none() {
            return Err(ConfigError::InvalidPin {
                board: board.name().to_string(),
                pin,
            });
        }
        Ok(Self::Board { board, pin })
    }

    /// Waiter suited to this backend's timing budget
    pub fn default_waiter(&self) -> WaiterKind {
        match self {
            Self::Owned(_) => WaiterKind::Spin,
            Self::Board { .. } => WaiterKind::Sleep,
        }
    }

    /// Run `f` with the line, resolving board pins first
    pub fn with_line<R>(&self, f: impl FnOnce(&dyn OutputLine) -> R) -> Result<R, LineError> {
        match self {
            Self::Owned(line) => Ok(f(line.as_ref())),
            Self::Board { board, pin } => {
                let line = board.pin_by_name(pin)?;
                Ok(f(line.as_ref()))
            }
        }
    }
}
