//! # mycohub-adapter-mqtt
//!
//! MQTT adapter: connects mycohub to the broker.
//!
//! ## Responsibilities
//! - Maintain the broker session and its subscriptions
//!   (`clients/+/sensor/sht3x`, `clients/+/register`, broker presence)
//! - Hand every inbound message to the scheduler without blocking
//! - Implement the `MessagePublisher` port for actuator commands
//!
//! ## Dependency rule
//! Same as other adapters: depends on `mycohub-app` and `mycohub-domain`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod publisher;

pub use bridge::{BridgeHandle, MqttBridge};
pub use config::MqttConfig;
pub use error::MqttError;
pub use publisher::MqttPublisher;
