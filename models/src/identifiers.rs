// models/src/identifiers.rs

use core::ops::Deref;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};

/// An email address in canonical form: trimmed and lower-cased. Every roster
/// lookup and every write goes through this type, so exact-match queries on
/// the `email` field agree with what was stored.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalises and validates `value`.
    ///
    /// # Errors
    /// `MissingEmail` for blank input, `InvalidEmail` when there is no
    /// non-empty local part and domain around a single `@`.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::MissingEmail);
        }

        match normalized.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalized.contains(char::is_whitespace) =>
            {
                Ok(Self(normalized))
            }
            _ => Err(ValidationError::InvalidEmail(value.trim().to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local part of the address, used as a doctor's display name.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl Deref for Email {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a fresh document identifier.
pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Display name derived from an email address: its local part, or `"Doctor"`
/// when the address has none.
pub fn display_name_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.trim().is_empty() => local.trim().to_string(),
        _ => "Doctor".to_string(),
    }
}
