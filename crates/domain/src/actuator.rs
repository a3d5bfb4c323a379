//! Actuators: the controllable outputs of a client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::error::ValidationError;
use crate::time::{Timestamp, now};

/// One of the four outputs every client exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    Light,
    Fan,
    Humidifier,
    Motor,
}

impl ActuatorKind {
    pub const ALL: [Self; 4] = [Self::Light, Self::Fan, Self::Humidifier, Self::Motor];

    /// Name stored in the `actuators` table.
    #[must_use]
    pub fn stored_name(self) -> &'static str {
        match self {
            Self::Light => "Iluminacion",
            Self::Fan => "Ventilacion",
            Self::Humidifier => "Humidificador",
            Self::Motor => "Motor",
        }
    }

    /// Last segment of the outbound control topic.
    #[must_use]
    pub fn topic_suffix(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Fan => "fan",
            Self::Humidifier => "humidifier",
            Self::Motor => "motor",
        }
    }

    /// `clients/{id}/{suffix}`
    #[must_use]
    pub fn control_topic(self, client_id: &ClientId) -> String {
        format!("clients/{client_id}/{}", self.topic_suffix())
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic_suffix())
    }
}

impl FromStr for ActuatorKind {
    type Err = ValidationError;

    /// Accepts the stored name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.stored_name() == s)
            .ok_or_else(|| ValidationError::UnknownActuator(s.to_string()))
    }
}

/// Control payload for a desired state: lowercase `true` / `false`.
#[must_use]
pub fn control_payload(on: bool) -> &'static str {
    if on { "true" } else { "false" }
}

/// One recorded actuator change. The latest row per client and actuator is
/// the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub client_id: ClientId,
    pub actuator: ActuatorKind,
    pub on: bool,
    pub timestamp: Timestamp,
}

impl ActuatorState {
    #[must_use]
    pub fn new(client_id: ClientId, actuator: ActuatorKind, on: bool) -> Self {
        Self {
            client_id,
            actuator,
            on,
            timestamp: now(),
        }
    }
}
