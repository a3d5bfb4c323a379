//! Event: a free-text audit record of something that happened to a client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::error::ValidationError;
use crate::ideal_range::{IdealRange, ParameterKind};
use crate::time::{Timestamp, now};

/// Tag used to filter the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    #[serde(rename = "temperatura")]
    Temperature,
    #[serde(rename = "humedad")]
    Humidity,
    #[serde(rename = "actuador")]
    Actuator,
}

impl EventTopic {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperatura",
            Self::Humidity => "humedad",
            Self::Actuator => "actuador",
        }
    }
}

impl From<ParameterKind> for EventTopic {
    fn from(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Temperature => Self::Temperature,
            ParameterKind::Humidity => Self::Humidity,
        }
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventTopic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperatura" => Ok(Self::Temperature),
            "humedad" => Ok(Self::Humidity),
            "actuador" => Ok(Self::Actuator),
            other => Err(ValidationError::UnknownEventTopic(other.to_string())),
        }
    }
}

/// An immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub client_id: ClientId,
    pub message: String,
    pub topic: EventTopic,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(client_id: ClientId, message: impl Into<String>, topic: EventTopic) -> Self {
        Self {
            client_id,
            message: message.into(),
            topic,
            timestamp: now(),
        }
    }

    /// Warning recorded when `value` falls outside `range`.
    #[must_use]
    pub fn out_of_range(range: &IdealRange, value: f64) -> Self {
        let message = match range.kind {
            ParameterKind::Temperature => format!(
                "Advertencia! Temperatura fuera de rango: {value} C (Ideal: {}-{} C)",
                range.min, range.max
            ),
            ParameterKind::Humidity => format!(
                "Advertencia! Humedad fuera de rango: {value} % (Ideal: {}-{} %)",
                range.min, range.max
            ),
        };
        Self::new(range.client_id.clone(), message, range.kind.into())
    }

    /// Record of an actuator transition, described by its reason.
    #[must_use]
    pub fn actuator_changed(client_id: ClientId, reason: &str) -> Self {
        Self::new(client_id, reason, EventTopic::Actuator)
    }
}
