//! # Fibonacci Backoff
//!
//! Provides a Fibonacci-based requeue delay for failed reconcile cycles.
//! The sequence grows more slowly than exponential backoff, which keeps a
//! misconfigured workload from being hammered while still retrying often
//! enough to pick up a late-created preset.
//!
//! With the controller's 5 second floor and 300 second cap the sequence is
//! 5s, 5s, 10s, 15s, 25s, 40s, 65s, 105s, 170s, 275s, 300s, 300s, ...

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the two before it, starting at the floor and
/// clamped at the cap.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Floor value in seconds, also the reset point
    min_seconds: u64,
    /// Previous delay in seconds
    prev_seconds: u64,
    /// Current delay in seconds
    current_seconds: u64,
    /// Cap value in seconds
    max_seconds: u64,
}

impl FibonacciBackoff {
    /// Create a new backoff with the given floor and cap in seconds
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        FibonacciBackoff {
            min_seconds,
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Get the next delay in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_seconds;

        let next = self.prev_seconds + self.current_seconds;
        self.prev_seconds = self.current_seconds;
        self.current_seconds = std::cmp::min(next, self.max_seconds);

        result
    }

    /// Get the next delay as a `Duration` and advance the sequence
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Reset the sequence to the floor after a successful cycle
    pub fn reset(&mut self) {
        self.prev_seconds = 0;
        self.current_seconds = self.min_seconds;
    }
}
