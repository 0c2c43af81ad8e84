//! The free-text concern a user submits when entering the waiting pool.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

pub const CONCERN_MIN_CHARS: usize = 10;
pub const CONCERN_MAX_CHARS: usize = 100;

/// Validated concern text (10 to 100 characters, counted as Unicode scalars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Concern(String);

impl Concern {
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        let len = text.trim().chars().count();
        if len < CONCERN_MIN_CHARS {
            return Err(DomainError::validation(format!(
                "Concern must be at least {} characters (got {})",
                CONCERN_MIN_CHARS, len
            )));
        }
        if len > CONCERN_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "Concern must be at most {} characters (got {})",
                CONCERN_MAX_CHARS, len
            )));
        }
        Ok(Self(text.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Concern {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Concern> for String {
    fn from(value: Concern) -> Self {
        value.0
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
