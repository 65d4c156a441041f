//! Error types for the disk configuration engine.

use thiserror::Error;

use crate::validation::DiskField;

/// Result type alias for disk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or submitting a disk.
///
/// Field validation problems are reported through
/// [`DiskValidation`](crate::DiskValidation), not through this type; they only
/// surface here when something tries to build results from an invalid form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A reference value could not be parsed.
    #[error("unknown {field} value '{value}'")]
    UnknownValue {
        /// The field being parsed.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Results were requested from a form that does not validate.
    #[error("invalid {field}: {reason}")]
    InvalidForm {
        /// First failing field.
        field: DiskField,
        /// Why it failed.
        reason: String,
    },

    /// The form is not accepting this action in its current phase.
    #[error("form is not editable while {0}")]
    NotEditable(&'static str),

    /// The external submit call rejected the disk.
    #[error("submit failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Failure reported by a [`DiskSubmitter`](crate::DiskSubmitter).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SubmitError {
    /// User-visible message.
    pub message: String,
}

impl SubmitError {
    /// Creates a submit error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidForm {
            field: DiskField::Url,
            reason: "URL must start with http:// or https://".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid url: URL must start with http:// or https://"
        );

        let err = Error::from(SubmitError::new("admission webhook denied the request"));
        assert_eq!(
            err.to_string(),
            "submit failed: admission webhook denied the request"
        );
    }
}
