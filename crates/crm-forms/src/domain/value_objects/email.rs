//! Email Value Object
//!
//! Syntactic email address check used by email fields.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Syntactically valid email address.
///
/// The address is stored exactly as entered: submissions are persisted
/// verbatim, so no case folding happens here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address
    pub fn new(value: impl Into<String>) -> Result<Self, EmailError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(EmailError::Empty);
        }

        if !Self::is_valid(&value) {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(value))
    }

    /// Check a candidate string without allocating
    pub fn is_valid(candidate: &str) -> bool {
        let local_len = candidate.split('@').next().map(str::len).unwrap_or(0);
        local_len <= 64 && candidate.len() <= 254 && email_pattern().is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain part (after @)
    pub fn domain(&self) -> Option<&str> {
        self.0.split('@').nth(1)
    }

    /// Local part (before @)
    pub fn local_part(&self) -> Option<&str> {
        self.0.split('@').next()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("Email cannot be empty")]
    Empty,
    #[error("Please enter a valid email address")]
    InvalidFormat,
}
