//! Monotonic wall-clock timers for benchmarking

use std::time::Instant;

/// A monotonic clock reporting seconds since an arbitrary fixed origin
pub trait MonotonicTimer {
    /// Seconds elapsed since the timer's origin
    fn now(&self) -> f64;

    /// Seconds spent in `f`, returned together with its output
    fn time<F: FnOnce() -> R, R>(&self, f: F) -> (R, f64) {
        let start = self.now();
        let out = f();
        (out, self.now() - start)
    }
}

/// Timer whose origin is the moment it was created
///
/// Every benchmark run owns its own instance, so there is no process-wide start time.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    origin: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Stopwatch {
            origin: Instant::now(),
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTimer for Stopwatch {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
