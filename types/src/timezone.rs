//! The processing timezone handed to auto-processing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timezone identifier used as the auto-processing cutoff for one sweep.
///
/// Accepts IANA names (`Europe/London`), fixed offsets (`+01:00`) and
/// facility timezone-group labels (`European`, `EST`). The label is opaque to
/// the sweep; only the auto-processing collaborator interprets it.
///
/// # Invariants
///
/// - Non-empty after trimming
/// - Contains no whitespace or control characters
///
/// # Serde
///
/// Serializes as a plain string. Deserialization runs the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProcessingTimezone(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTimezoneError {
    #[error("timezone must not be empty")]
    Empty,
    #[error("timezone {0:?} contains whitespace or control characters")]
    IllegalCharacter(String),
}

impl ProcessingTimezone {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidTimezoneError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(InvalidTimezoneError::Empty);
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(InvalidTimezoneError::IllegalCharacter(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// UTC, the zone used when a facility pins its cutoff to universal time.
    #[must_use]
    pub fn utc() -> Self {
        Self("UTC".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProcessingTimezone {
    type Error = InvalidTimezoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ProcessingTimezone {
    type Error = InvalidTimezoneError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProcessingTimezone> for String {
    fn from(value: ProcessingTimezone) -> Self {
        value.0
    }
}

impl AsRef<str> for ProcessingTimezone {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProcessingTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
