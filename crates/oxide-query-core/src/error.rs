//! Error types for the query metadata model.

use thiserror::Error;

/// Errors raised while building or persisting query metadata.
///
/// Every variant is a contract violation reported synchronously by the call
/// that detected it. The call that fails leaves the metadata unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A value handed to a mutator or constructor is not acceptable
    /// (negative limit/offset, missing predicate, unknown join id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires state the metadata does not have yet.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value could not be encoded, decoded, or did not survive the round
    /// trip unchanged.
    #[error("serialization of `{type_name}` failed: {message}")]
    SerializationFailure {
        /// Fully qualified name of the offending type.
        type_name: &'static str,
        /// What went wrong.
        message: String,
    },
}

impl QueryError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub(crate) fn serialization<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::SerializationFailure {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// Result type alias for query metadata operations.
pub type Result<T> = std::result::Result<T, QueryError>;
