//! Per-key cooldowns.
//!
//! Used for out-of-range alerts, keyed by client and metric, and for the
//! client status refresh, keyed by client. Callers record a key before the
//! guarded action and [`Cooldown::restore`] it if the action fails, so
//! concurrent handlers cannot both fire and a failure does not silence the
//! next attempt.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct Cooldown<K> {
    period: Duration,
    last: HashMap<K, Instant>,
}

impl<K: Eq + Hash> Cooldown<K> {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last: HashMap::new(),
        }
    }

    /// True when `key` was never recorded or its cooldown has strictly elapsed.
    #[must_use]
    pub fn should_fire(&self, key: &K, now: Instant) -> bool {
        self.last
            .get(key)
            .is_none_or(|at| now.saturating_duration_since(*at) > self.period)
    }

    pub fn record(&mut self, key: K, now: Instant) {
        self.last.insert(key, now);
    }

    /// Last time `key` fired, if ever.
    #[must_use]
    pub fn last_fired(&self, key: &K) -> Option<Instant> {
        self.last.get(key).copied()
    }

    /// Put back what [`Self::last_fired`] returned before a failed action.
    pub fn restore(&mut self, key: K, previous: Option<Instant>) {
        match previous {
            Some(at) => {
                self.last.insert(key, at);
            }
            None => {
                self.last.remove(&key);
            }
        }
    }
}
