/*!
Board capability: named pins and their GPIO character-device mapping.

A board answers two questions about a named pin: which chip device and line
offset it maps to, and (for the board backend) a settable line for it. Boards
are looked up by name in a [`BoardRegistry`].
*/

use serde::{Deserialize, Serialize};
use shared::protocol::NO_PIN;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ConfigError, LineError};
use crate::line::{DirectLine, OutputLine};

/// Name of the built-in Raspberry Pi 40-pin header board
pub const RASPBERRY_PI: &str = "raspberry-pi";

/// Location of a pin on a GPIO character device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioMapping {
    /// Character device path, e.g. `/dev/gpiochip0`
    pub chip: String,
    /// Line offset on that chip
    pub line: u32,
}

impl GpioMapping {
    pub fn new(chip: impl Into<String>, line: u32) -> Self {
        Self {
            chip: chip.into(),
            line,
        }
    }

    /// The "no such pin" sentinel
    pub fn none() -> Self {
        Self {
            chip: String::new(),
            line: NO_PIN,
        }
    }

    pub fn is_none(&self) -> bool {
        self.line == NO_PIN
    }

    /// Attribute an error to this device and line
    pub fn line_error(&self, source: impl Into<crate::error::BoxError>) -> LineError {
        LineError::new(self.chip.clone(), self.line, source)
    }
}

/// External board abstraction exposing named digital pins
pub trait Board: Send + Sync {
    fn name(&self) -> &str;

    /// Map a pin name to its chip and offset, or [`GpioMapping::none`]
    fn gpio_mapping(&self, pin: &str) -> GpioMapping;

    /// Obtain a settable line for a pin
    fn pin_by_name(&self, pin: &str) -> Result<Box<dyn OutputLine>, LineError>;

    /// Pin names known to this board
    fn pin_names(&self) -> Vec<String>;
}

/// A board described by a static pin table
///
/// `pin_by_name` opens the character device on every call; the returned
/// line is released when dropped.
#[derive(Debug, Clone)]
pub struct MappedBoard {
    name: String,
    pins: BTreeMap<String, GpioMapping>,
}

impl MappedBoard {
    pub fn new(name: impl Into<String>, pins: BTreeMap<String, GpioMapping>) -> Self {
        Self {
            name: name.into(),
            pins,
        }
    }

    /// Raspberry Pi 40-pin header: physical pin number to BCM line on gpiochip0
    pub fn raspberry_pi() -> Self {
        const HEADER: [(u8, u32); 28] = [
            (3, 2), (5, 3), (7, 4), (8, 14), (10, 15), (11, 17), (12, 18),
            (13, 27), (15, 22), (16, 23), (18, 24), (19, 10), (21, 9), (22, 25),
            (23, 11), (24, 8), (26, 7), (27, 0), (28, 1), (29, 5), (31, 6),
            (32, 12), (33, 13), (35, 19), (36, 16), (37, 26), (38, 20), (40, 21),
        ];

        let pins = HEADER
            .iter()
            .map(|(pin, line)| (pin.to_string(), GpioMapping::new("/dev/gpiochip0", *line)))
            .collect();
        Self::new(RASPBERRY_PI, pins)
    }
}

impl Board for MappedBoard {
    fn name(&self) -> &str {
        &self.name
    }

    fn gpio_mapping(&self, pin: &str) -> GpioMapping {
        self.pins.get(pin).cloned().unwrap_or_else(GpioMapping::none)
    }

    fn pin_by_name(&self, pin: &str) -> Result<Box<dyn OutputLine>, LineError> {
        let mapping = self.gpio_mapping(pin);
        debug!("Board {} resolving pin {} to {:?}", self.name, pin, mapping);
        Ok(Box::new(DirectLine::open(mapping)?))
    }

    fn pin_names(&self) -> Vec<String> {
        self.pins.keys().cloned().collect()
    }
}

/// Boards available for lookup by name
#[derive(Clone, Default)]
pub struct BoardRegistry {
    boards: BTreeMap<String, Arc<dyn Board>>,
}

impl BoardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing the built-in boards
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MappedBoard::raspberry_pi()));
        registry
    }

    /// Add a board, replacing any board with the same name
    pub fn register(&mut self, board: Arc<dyn Board>) {
        self.boards.insert(board.name().to_string(), board);
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Board>, ConfigError> {
        self.boards
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownBoard(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }
}
