//! Error types for the topology pipeline.

use thiserror::Error;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering factories or watching resources.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A factory with this id is already registered.
    #[error("factory '{0}' is already registered")]
    DuplicateFactory(String),

    /// No factory with this id is registered.
    #[error("factory '{0}' is not registered")]
    UnknownFactory(String),

    /// The watch source refused a subscription.
    #[error("cannot watch {kind} in namespace '{namespace}': {reason}")]
    SubscriptionDenied {
        /// Kind reference.
        kind: String,
        /// Namespace of the subscription.
        namespace: String,
        /// Why the subscription was refused.
        reason: String,
    },

    /// Core vocabulary error.
    #[error(transparent)]
    Core(#[from] kconsole_core::Error),
}

/// Failure of a single factory's transform.
///
/// Recorded against the factory in the aggregated model; never aborts the
/// aggregation of other factories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    /// What went wrong.
    pub message: String,
}

impl TransformError {
    /// Creates a transform error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
