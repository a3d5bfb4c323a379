//! Readings: temperature/humidity samples reported by a client.

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::error::PayloadError;
use crate::time::{Timestamp, now};

/// A decoded `temperature,humidity` sample, not yet attributed to a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl Measurement {
    /// Parse the SHT3x payload: exactly two comma-separated decimal numbers.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::FieldCount`] when there are not exactly two
    /// fields and [`PayloadError::NotANumber`] when a field does not parse
    /// as a finite number.
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
        let [temperature, humidity] = fields.as_slice() else {
            return Err(PayloadError::FieldCount {
                expected: 2,
                actual: fields.len(),
            });
        };
        Ok(Self {
            temperature: parse_field("temperature", temperature)?,
            humidity: parse_field("humidity", humidity)?,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f64, PayloadError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PayloadError::NotANumber {
            field,
            value: value.to_string(),
        })
}

/// A persisted telemetry sample. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub client_id: ClientId,
    pub timestamp: Timestamp,
    pub temperature: f64,
    pub humidity: f64,
}

impl Reading {
    /// Stamp a measurement with its client and the current time.
    #[must_use]
    pub fn new(client_id: ClientId, measurement: Measurement) -> Self {
        Self {
            client_id,
            timestamp: now(),
            temperature: measurement.temperature,
            humidity: measurement.humidity,
        }
    }
}
