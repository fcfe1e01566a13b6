/*!
Frame transmitter.

A transmission renders the code as 24 bits, then sends the frame (24 data
symbols and a SYNC) `TX_REPEAT` times. The first line error aborts the whole
transmission and leaves the line in whatever state the last successful set
produced.

Cancellation is cooperative: the [`CancelToken`] is checked before every
symbol, so the pulse in flight always completes. A cancelled transmission
drives the line low before returning.
*/

use shared::protocol::{DEFAULT_PULSE_LENGTH_US, TX_REPEAT};
use shared::Code;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::TransmitError;
use crate::line::{LineBackend, OutputLine};
use crate::pulse::PulseEmitter;
use crate::waiter::PrecisionWaiter;

/// Shared cancellation flag for a transmitter
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a completed transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitReport {
    pub code: Code,
    pub binary: String,
    pub repetitions: usize,
    pub symbols: usize,
    pub elapsed: Duration,
}

/// Sends codes on one line
pub struct Transmitter {
    backend: LineBackend,
    waiter: Box<dyn PrecisionWaiter>,
    pulse_length: Duration,
    repeat: usize,
    cancel: CancelToken,
    // Held for a whole transmission so concurrent calls queue instead of interleaving
    in_flight: Mutex<()>,
}

impl Transmitter {
    pub fn new(backend: LineBackend, pulse_length: Duration, waiter: Box<dyn PrecisionWaiter>) -> Self {
        Self {
            backend,
            waiter,
            pulse_length,
            repeat: TX_REPEAT,
            cancel: CancelToken::default(),
            in_flight: Mutex::new(()),
        }
    }

    /// Transmitter with the default pulse length and the backend's preferred waiter
    pub fn with_defaults(backend: LineBackend) -> Self {
        let waiter = backend.default_waiter().build();
        Self::new(backend, Duration::from_micros(DEFAULT_PULSE_LENGTH_US), waiter)
    }

    pub fn pulse_length(&self) -> Duration {
        self.pulse_length
    }

    pub fn repeat(&self) -> usize {
        self.repeat
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Send `code` `repeat` times, each repetition closed by SYNC
    pub fn transmit(&self, code: Code) -> Result<TransmitReport, TransmitError> {
        let _in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        let binary = code.render();
        info!("📡 Transmitting code {}", code);
        info!("Transmitting binary {}", binary);

        let start = Instant::now();
        let result = self
            .backend
            .with_line(|line| self.send_frames(line, code))
            .map_err(TransmitError::from)
            .and_then(|sent| sent);

        match result {
            Ok(symbols) => {
                let elapsed = start.elapsed();
                info!("✅ Transmission successful ({} symbols in {:?})", symbols, elapsed);
                Ok(TransmitReport {
                    code,
                    binary,
                    repetitions: self.repeat,
                    symbols,
                    elapsed,
                })
            }
            Err(e) => {
                error!("Transmission of code {} failed: {}", code, e);
                Err(e)
            }
        }
    }

    fn send_frames(&self, line: &dyn OutputLine, code: Code) -> Result<usize, TransmitError> {
        let emitter = PulseEmitter::new(line, self.waiter.as_ref(), self.pulse_length);
        let mut emitted = 0;

        for repetition in 0..self.repeat {
            for symbol in code.frame() {
                if self.cancel.is_cancelled() {
                    warn!("🛑 Transmission cancelled after {} symbols", emitted);
                    if let Err(e) = line.set(false) {
                        warn!("Failed to drive line low after cancellation: {}", e);
                    }
                    return Err(TransmitError::Cancelled { emitted });
                }
                emitter.emit_symbol(symbol)?;
                emitted += 1;
            }
            debug!("Repetition {}/{} sent", repetition + 1, self.repeat);
        }

        Ok(emitted)
    }

    /// Cancel any transmission in progress and refuse new ones
    ///
    /// Idempotent. The line itself is released when the transmitter is dropped.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            info!("Closing transmitter");
        }
        self.cancel.cancel();
    }
}
