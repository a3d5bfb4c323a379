//! [`MessagePublisher`] over a rumqttc client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rumqttc::{AsyncClient, QoS};

use mycohub_app::ports::MessagePublisher;
use mycohub_domain::error::MycoError;

use crate::error::MqttError;

/// Publishes with at-least-once delivery while a session is up.
///
/// Never waits on the client's request queue: a full queue is reported as
/// an error so the caller can retry later.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, connected: Arc<AtomicBool>) -> Self {
        Self { client, connected }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl MessagePublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), MycoError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected.into());
        }
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .map_err(MqttError::Client)?;
        tracing::debug!(topic, payload, "published");
        Ok(())
    }
}
