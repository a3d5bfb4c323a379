//! Operating mode: whether automation may drive a client's actuators.
//!
//! The mode is owned by the CRUD layer; the engine only reads it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "automatico")]
    Automatic,
}

impl OperatingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatico",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "automatico" => Ok(Self::Automatic),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}
