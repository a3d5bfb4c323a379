//! Publisher port: outbound control messages to the broker.

use std::future::Future;
use std::sync::Arc;

use mycohub_domain::error::MycoError;

/// Sends one message with at-least-once delivery.
pub trait MessagePublisher {
    /// Publish `payload` on `topic`.
    ///
    /// Fails with [`MycoError::Transport`] when the transport is not
    /// connected or rejects the message; the caller decides whether to retry.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), MycoError>> + Send;
}

impl<T: MessagePublisher + Send + Sync> MessagePublisher for Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), MycoError>> + Send {
        (**self).publish(topic, payload)
    }
}
