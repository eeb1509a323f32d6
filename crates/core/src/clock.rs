// SPDX-License-Identifier: MIT

//! Clock abstraction so tests can inject deterministic time instead of
//! sleeping on wall-clock deadlines.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of wall-clock and monotonic time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current monotonic instant, used for deadlines and elapsed-time math.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch, used for event timestamps.
    fn now_ms(&self) -> u64;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

/// Deterministic clock for tests; advance it explicitly.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

struct FakeClockState {
    instant: Instant,
    ms: u64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                instant: Instant::now(),
                ms: 0,
            })),
        }
    }

    /// Move the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        let mut state = self.inner.lock();
        state.instant += d;
        state.ms += d.as_millis() as u64;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn now_ms(&self) -> u64 {
        self.inner.lock().ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
