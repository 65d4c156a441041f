//! Error types for item selection.

use thiserror::Error;

/// Result type alias for selection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building collections or selecting items.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two items share the same name.
    #[error("duplicate item name: {0}")]
    DuplicateItem(String),

    /// The requested item is not part of the collection.
    #[error("unknown item: {0}")]
    UnknownItem(String),
}
