//! Clients: the embedded controllers that publish telemetry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, ValidationError};

/// Identifier a client uses in its topic path (`clients/{id}/…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Validate and wrap a client identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyClientId`] for an empty string and
    /// [`ValidationError::SlashInClientId`] when the value could not be a
    /// single topic segment.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyClientId);
        }
        if value.contains('/') {
            return Err(ValidationError::SlashInClientId);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Connection status tracked by the client directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Online,
    Offline,
}

impl ClientStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-registration announced on `clients/{id}/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub description: String,
}

impl Registration {
    /// Parse a `name[,description]` payload.
    ///
    /// Everything after the first comma is the description, so descriptions
    /// may themselves contain commas.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::EmptyName`] when the name is blank.
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let (name, description) = match payload.split_once(',') {
            Some((name, description)) => (name.trim(), description.trim()),
            None => (payload.trim(), ""),
        };
        if name.is_empty() {
            return Err(PayloadError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
        })
    }
}
