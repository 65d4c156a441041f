//! Validated namespace names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of a namespace name (DNS-1123 label).
pub const NAMESPACE_MAX_LENGTH: usize = 63;

/// A validated namespace name.
///
/// Namespaces must:
/// - Be between 1 and 63 characters
/// - Contain only lowercase alphanumeric characters and hyphens
/// - Start and end with an alphanumeric character
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Creates a new `Namespace` after validating the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNamespace`] if the name is not a DNS-1123 label.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    /// Returns the namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidNamespace {
            value: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("namespace cannot be empty");
    }

    if name.len() > NAMESPACE_MAX_LENGTH {
        return reject("namespace cannot exceed 63 characters");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return reject("namespace can only contain lowercase alphanumeric characters and hyphens");
    }

    if name.starts_with('-') || name.ends_with('-') {
        return reject("namespace must start and end with an alphanumeric character");
    }

    Ok(())
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
