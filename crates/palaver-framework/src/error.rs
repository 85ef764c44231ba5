//! Error types for the Palaver framework.

use palaver_core::ExtractError;
use thiserror::Error;

pub use tower::BoxError;

/// Why a handler's declared requirements rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchFailure {
    /// The required intent is not among the detected intents.
    #[error("intent '{intent}' not found")]
    IntentAbsent {
        /// The intent the handler requires.
        intent: String,
    },

    /// No instance of a required entity was extracted.
    #[error("entity '{name}' not found")]
    EntityAbsent {
        /// Entity name.
        name: String,
    },

    /// The entity was extracted but none of its instances has the value.
    #[error("entity '{name}' has no instance with value '{value}'")]
    EntityValueAbsent {
        /// Entity name.
        name: String,
        /// Expected value.
        value: String,
    },

    /// The entity was sent, but not as a list of entity objects.
    #[error("entity '{name}' is malformed")]
    EntityMalformed {
        /// Entity name.
        name: String,
    },
}

/// A failed attempt of a single handler.
///
/// The chain recovers from every variant by moving on to the next handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler's requirements did not match the request.
    #[error("declined: {0}")]
    Declined(#[from] MatchFailure),

    /// A handler parameter could not be extracted from the request.
    #[error("parameter extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// The handler ran and returned an error.
    #[error("handler failed: {0}")]
    Failed(BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The handler produced something that is not a response.
    #[error("handler output is not a response: {0}")]
    MalformedOutput(String),
}

impl HandlerError {
    /// Wraps an arbitrary error as an execution failure.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Returns `true` if the handler declined the request through its
    /// requirements, as opposed to failing while running.
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined(_))
    }
}

/// Errors that escape a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every handler in the chain declined or failed.
    #[error("no handler matched after {attempts} attempt(s)")]
    NoHandlerMatched {
        /// Number of handlers tried.
        attempts: usize,
    },

    /// The inbound payload lacks the expected shape.
    #[error("failed to extract request: {0}")]
    Extract(#[from] ExtractError),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
