//! MQTT adapter error types.

use mycohub_domain::error::MycoError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No broker session is established.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client rejected the request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl From<MqttError> for MycoError {
    fn from(err: MqttError) -> Self {
        Self::Transport(Box::new(err))
    }
}
