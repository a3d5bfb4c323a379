//! Ideal ranges: the per-client band each metric should stay within.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::error::ValidationError;
use crate::time::{Timestamp, now};

/// The metric an ideal range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    #[serde(rename = "temperatura")]
    Temperature,
    #[serde(rename = "humedad")]
    Humidity,
}

impl ParameterKind {
    pub const ALL: [Self; 2] = [Self::Temperature, Self::Humidity];

    /// Stored/tagged representation shared with the CRUD layer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperatura",
            Self::Humidity => "humedad",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperatura" => Ok(Self::Temperature),
            "humedad" => Ok(Self::Humidity),
            other => Err(ValidationError::UnknownParameterKind(other.to_string())),
        }
    }
}

/// Where a value falls relative to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Below,
    Within,
    Above,
}

/// The current acceptable band for one metric of one client.
///
/// `min <= max` is the caller's responsibility. An inverted range is never
/// satisfied: every value classifies as [`Position::Below`] or
/// [`Position::Above`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealRange {
    pub client_id: ClientId,
    pub kind: ParameterKind,
    pub min: f64,
    pub max: f64,
    pub timestamp: Timestamp,
}

impl IdealRange {
    /// Create a range stamped with the current time.
    #[must_use]
    pub fn new(client_id: ClientId, kind: ParameterKind, min: f64, max: f64) -> Self {
        Self {
            client_id,
            kind,
            min,
            max,
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> Position {
        if value < self.min {
            Position::Below
        } else if value > self.max {
            Position::Above
        } else {
            Position::Within
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.classify(value) == Position::Within
    }
}
