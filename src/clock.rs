//! Monotonic tick source for timing attribution
//!
//! All timing inside the profiler is kept in integer ticks (nanoseconds)
//! and converted to seconds only when a report is built. The tick source
//! is a trait so tests can drive attribution with a deterministic clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic ticks
///
/// One tick is one nanosecond; `tick_factor()` converts accumulated ticks
/// to wall-clock seconds.
pub trait TickSource: Send + Sync {
    /// Current tick count (monotonic, origin arbitrary)
    fn tick_count(&self) -> u64;

    /// Seconds per tick
    fn tick_factor(&self) -> f64 {
        1e-9
    }
}

/// Default tick source backed by `std::time::Instant`
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock anchored at the current instant
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn tick_count(&self) -> u64 {
        // saturates after ~584 years of process uptime
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Manually driven tick source for deterministic tests
///
/// Cloning shares the underlying counter, so a test can hold one half and
/// hand the other to the profiler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at tick zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `nanos` ticks
    pub fn advance(&self, nanos: u64) {
        self.ticks.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Advance the clock by whole milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(millis * 1_000_000);
    }
}

impl TickSource for ManualClock {
    fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}
