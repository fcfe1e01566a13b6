//! Instrumented lines, fake clock and mock board for unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::board::{Board, GpioMapping};
use crate::error::LineError;
use crate::line::OutputLine;
use crate::waiter::PrecisionWaiter;

/// Monotonic time that only moves when a waiter advances it
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

/// Waiter that advances the fake clock instead of blocking
#[derive(Debug, Clone)]
pub struct RecordingWaiter {
    clock: FakeClock,
}

impl RecordingWaiter {
    pub fn new(clock: FakeClock) -> Self {
        Self { clock }
    }
}

impl PrecisionWaiter for RecordingWaiter {
    fn wait(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

/// Shared call counter
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Line that records every successful set with its fake-clock timestamp
#[derive(Debug, Clone)]
pub struct RecordingLine {
    clock: FakeClock,
    events: Arc<Mutex<Vec<(Duration, bool)>>>,
    attempts: Counter,
    fail_at: Option<usize>,
}

impl RecordingLine {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            clock,
            events: Arc::default(),
            attempts: Counter::default(),
            fail_at: None,
        }
    }

    /// Fail the `call`-th set (1-based)
    pub fn failing_at(clock: FakeClock, call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::new(clock)
        }
    }

    /// Set calls attempted, including a failed one
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.events.lock().unwrap().iter().map(|(_, high)| *high).collect()
    }

    /// Level and duration of each phase, the last one measured up to now
    pub fn phases(&self) -> Vec<(bool, Duration)> {
        let events = self.events.lock().unwrap();
        events
            .iter()
            .enumerate()
            .map(|(i, (at, high))| {
                let end = events.get(i + 1).map(|(t, _)| *t).unwrap_or_else(|| self.clock.now());
                (*high, end - *at)
            })
            .collect()
    }
}

impl OutputLine for RecordingLine {
    fn set(&self, high: bool) -> Result<(), LineError> {
        let call = self.attempts.bump();
        if self.fail_at == Some(call) {
            return Err(LineError::new("/dev/mock-gpiochip", 0, "injected failure"));
        }
        self.events.lock().unwrap().push((self.clock.now(), high));
        Ok(())
    }
}

/// Board whose pins all share one recording line
pub struct MockBoard {
    pins: BTreeMap<String, GpioMapping>,
    line: RecordingLine,
    lookups: Counter,
}

impl MockBoard {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            pins: BTreeMap::new(),
            line: RecordingLine::new(clock),
            lookups: Counter::default(),
        }
    }

    pub fn with_pin(mut self, name: &str, mapping: GpioMapping) -> Self {
        self.pins.insert(name.to_string(), mapping);
        self
    }

    pub fn line(&self) -> RecordingLine {
        self.line.clone()
    }

    pub fn lookups(&self) -> Counter {
        self.lookups.clone()
    }
}

impl Board for MockBoard {
    fn name(&self) -> &str {
        "mock"
    }

    fn gpio_mapping(&self, pin: &str) -> GpioMapping {
        self.pins.get(pin).cloned().unwrap_or_else(GpioMapping::none)
    }

    fn pin_by_name(&self, pin: &str) -> Result<Box<dyn OutputLine>, LineError> {
        self.lookups.bump();
        let mapping = self.gpio_mapping(pin);
        if mapping.is_none() {
            return Err(mapping.line_error("no such pin"));
        }
        Ok(Box::new(self.line.clone()))
    }

    fn pin_names(&self) -> Vec<String> {
        self.pins.keys().cloned().collect()
    }
}
