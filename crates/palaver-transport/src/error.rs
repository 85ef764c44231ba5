//! Transport error types.

use thiserror::Error;

/// Errors that can occur while wiring or running a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two endpoints were mounted on the same path.
    #[error("Path already mounted: {0}")]
    DuplicatePath(String),

    /// The path cannot be used as a literal route.
    #[error("Invalid route path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
