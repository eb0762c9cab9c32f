//! Error types for rustevent-core.

use thiserror::Error;

/// Result type alias for event-list operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for event-list operations.
///
/// Every variant is returned at the point of the offending call and the
/// container it was called on is left unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed range, histogram input or interval set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not valid for the current event representation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Scalar division by exactly zero.
    #[error("division by zero")]
    DivideByZero,
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for [`Error::InvalidState`].
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
