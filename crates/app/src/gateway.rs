//! Persistence gateway: every store access goes through here.
//!
//! An operation that fails with a transient error ([`MycoError::Busy`]) is
//! retried after a fixed delay, up to a bounded number of attempts. Any
//! other error is returned immediately. The operation closure is re-run
//! from scratch on each attempt; it must not hold state in the store
//! between attempts.

use std::time::Duration;

use mycohub_domain::error::MycoError;

/// How often and how patiently a busy operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Wraps a store with the retry policy.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S> PersistenceGateway<S> {
    pub fn new(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Run a read-only operation.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-transient error.
    pub async fn read<T, F>(&self, name: &'static str, op: F) -> Result<T, MycoError>
    where
        F: AsyncFnMut(&S) -> Result<T, MycoError>,
    {
        self.run(name, op).await
    }

    /// Run an operation that modifies the store.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read`].
    pub async fn write<T, F>(&self, name: &'static str, op: F) -> Result<T, MycoError>
    where
        F: AsyncFnMut(&S) -> Result<T, MycoError>,
    {
        self.run(name, op).await
    }

    async fn run<T, F>(&self, name: &'static str, mut op: F) -> Result<T, MycoError>
    where
        F: AsyncFnMut(&S) -> Result<T, MycoError>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(&self.store).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        operation = name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "store busy, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::error!(
                            operation = name,
                            attempts = attempt,
                            error = %err,
                            "store still busy, giving up"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
