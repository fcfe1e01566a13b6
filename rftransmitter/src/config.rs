/*!
Configuration management for the RF transmitter.
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::protocol::DEFAULT_PULSE_LENGTH_US;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::board::{BoardRegistry, GpioMapping, MappedBoard, RASPBERRY_PI};
use crate::error::{ConfigError, LineError};
use crate::line::{DirectLine, LineBackend, OutputLine};
use crate::transmitter::Transmitter;
use crate::waiter::WaiterKind;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub transmitter: TransmitterConfig,

    /// Custom boards by name, in addition to the built-in ones
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub boards: BTreeMap<String, BoardConfig>,

    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            transmitter: TransmitterConfig::default(),
            boards: BTreeMap::new(),
            server: ServerConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Built-in boards plus the boards declared in this file
    pub fn board_registry(&self) -> BoardRegistry {
        let mut registry = BoardRegistry::with_builtin();
        for (name, board) in &self.boards {
            registry.register(Arc::new(MappedBoard::new(name.clone(), board.pins.clone())));
        }
        registry
    }

    /// Build the configured transmitter, opening its GPIO line
    pub fn build_transmitter(&self) -> Result<Transmitter, ConfigError> {
        self.transmitter.build(&self.board_registry())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How the transmitter reaches its data pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Open the pin's GPIO line once and hold it
    #[default]
    Direct,
    /// Ask the board for the pin on every transmission
    Board,
}

/// Transmitter specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitterConfig {
    /// Name of the board providing the data pin
    #[serde(default)]
    pub board: String,

    /// Pin name as understood by the board
    #[serde(default)]
    pub data_pin: String,

    /// Pulse length in microseconds, as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_length: Option<String>,

    #[serde(default)]
    pub backend: BackendKind,

    /// Defaults to spin for the direct backend, sleep for the board backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter: Option<WaiterKind>,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            board: RASPBERRY_PI.to_string(),
            data_pin: "11".to_string(),
            pulse_length: Some(DEFAULT_PULSE_LENGTH_US.to_string()),
            backend: BackendKind::Direct,
            waiter: None,
        }
    }
}

impl TransmitterConfig {
    /// Check required fields, returning the names of required dependencies
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.board.is_empty() {
            return Err(ConfigError::MissingField("board"));
        }
        if self.data_pin.is_empty() {
            return Err(ConfigError::MissingField("data_pin"));
        }
        Ok(vec![self.board.clone()])
    }

    /// Parsed pulse length, or the default when unset
    pub fn pulse_length(&self) -> Result<Duration, ConfigError> {
        let Some(raw) = &self.pulse_length else {
            return Ok(Duration::from_micros(DEFAULT_PULSE_LENGTH_US));
        };
        match raw.trim().parse::<u64>() {
            Ok(micros) if micros > 0 => Ok(Duration::from_micros(micros)),
            _ => Err(ConfigError::InvalidPulseLength(raw.clone())),
        }
    }

    /// Build a transmitter whose direct line is opened on a GPIO character device
    pub fn build(&self, registry: &BoardRegistry) -> Result<Transmitter, ConfigError> {
        self.build_with(registry, |mapping| {
            DirectLine::open(mapping).map(|line| Box::new(line) as Box<dyn OutputLine>)
        })
    }

    /// Build a transmitter, opening direct lines with `open_line`
    ///
    /// Everything that can be checked without hardware is checked before
    /// `open_line` is called.
    pub fn build_with<F>(&self, registry: &BoardRegistry, open_line: F) -> Result<Transmitter, ConfigError>
    where
        F: FnOnce(GpioMapping) -> Result<Box<dyn OutputLine>, LineError>,
    {
        self.validate()?;
        let pulse_length = self.pulse_length()?;
        let board = registry.lookup(&self.board)?;

        let backend = match self.backend {
            BackendKind::Direct => {
                let mapping = board.gpio_mapping(&self.data_pin);
                if mapping.is_none() {
                    return Err(ConfigError::InvalidPin {
                        board: board.name().to_string(),
                        pin: self.data_pin.clone(),
                    });
                }
                LineBackend::Owned(open_line(mapping)?)
            }
            BackendKind::Board => LineBackend::board(board, self.data_pin.clone())?,
        };

        let waiter = self.waiter.unwrap_or_else(|| backend.default_waiter());
        info!(
            "Transmitter on board {} pin {} ({:?} backend, {:?} waiter, pulse {:?})",
            self.board, self.data_pin, self.backend, waiter, pulse_length
        );
        Ok(Transmitter::new(backend, pulse_length, waiter.build()))
    }
}

/// Custom board pin table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    pub pins: BTreeMap<String, GpioMapping>,
}

/// Command endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// UDP bind address
    pub bind_addr: String,

    /// UDP port to listen on
    pub port: u16,

    /// Commands that may wait for the transmitter before new ones are refused
    pub queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 4330,
            queue_depth: 8,
        }
    }
}
