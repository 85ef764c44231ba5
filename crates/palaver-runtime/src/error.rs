//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use palaver_transport::TransportError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Building the router or serving requests failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A chain is already registered at this path.
    #[error("Route already registered: {0}")]
    DuplicateRoute(String),

    /// `run` was called with nothing to serve.
    #[error("No routes registered")]
    NoRoutes,

    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The `host:port` that was requested.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
