//! Error types for the core vocabulary.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid namespace name.
    #[error("invalid namespace '{value}': {reason}")]
    InvalidNamespace {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid kind reference string.
    #[error("invalid kind reference '{0}': expected group~version~kind")]
    InvalidKindReference(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_namespace() {
        let err = Error::InvalidNamespace {
            value: "Bad".to_string(),
            reason: "uppercase".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Bad"));
        assert!(msg.contains("uppercase"));
    }

    #[test]
    fn test_error_display_invalid_reference() {
        let err = Error::InvalidKindReference("Pod".to_string());
        assert_eq!(
            err.to_string(),
            "invalid kind reference 'Pod': expected group~version~kind"
        );
    }
}
