/*!
Precision waiting strategies used between line transitions.

OS sleeps overshoot sub-millisecond pulse widths by the scheduler's wake
latency, so the direct GPIO backend spins against the monotonic clock. The
board backend keeps ordinary sleeps.
*/

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

/// Blocks the calling thread for at least the requested duration
pub trait PrecisionWaiter: Send + Sync {
    fn wait(&self, duration: Duration);
}

/// Busy-waits on [`Instant`]; never returns early, overshoots by at most one clock read
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinWaiter;

impl PrecisionWaiter for SpinWaiter {
    fn wait(&self, duration: Duration) {
        let start = Instant::now();
        while start.elapsed() < duration {
            std::hint::spin_loop();
        }
    }
}

/// Ordinary timed sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepWaiter;

impl PrecisionWaiter for SleepWaiter {
    fn wait(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Waiter selection as it appears in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiterKind {
    Spin,
    Sleep,
}

impl WaiterKind {
    pub fn build(self) -> Box<dyn PrecisionWaiter> {
        match self {
            Self::Spin => Box::new(SpinWaiter),
            Self::Sleep => Box::new(SleepWaiter),
        }
    }
}
