//! Injectable time source
//!
//! Progress is always computed from wall-clock time, so the controller reads
//! "now" through this trait. Production uses [`SystemClock`]; tests drive a
//! [`ManualClock`] to make ticks deterministic.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that follows tokio's timer
///
/// Matches [`SystemClock`] in production, but honours paused and advanced
/// time in `#[tokio::test(start_paused = true)]` tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the controller.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at an arbitrary base instant
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Instant at which this clock started
    pub fn base(&self) -> Instant {
        self.base
    }

    /// Instant `secs` seconds after the base
    pub fn at(&self, secs: f64) -> Instant {
        self.base + Duration::from_secs_f64(secs.max(0.0))
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    /// Move the clock forward by fractional seconds
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs.max(0.0)));
    }

    /// Set the clock to `offset` after the base
    pub fn set(&self, offset: Duration) {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner()) = offset;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}
