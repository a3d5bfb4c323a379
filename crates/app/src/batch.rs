//! Flush policy shared by the telemetry buffer and the publish spooler.

use std::time::Duration;

/// A batch is due once it holds `max_len` items or its window is older
/// than `max_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_len: usize,
    pub max_age: Duration,
}

impl BatchLimits {
    #[must_use]
    pub const fn new(max_len: usize, max_age: Duration) -> Self {
        Self { max_len, max_age }
    }

    /// Whether a batch of `len` items opened `elapsed` ago must be flushed.
    #[must_use]
    pub fn is_due(&self, len: usize, elapsed: Duration) -> bool {
        len >= self.max_len || elapsed > self.max_age
    }
}
