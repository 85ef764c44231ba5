//! Error types for payload extraction.

use thiserror::Error;

/// Errors that can occur while pulling the intent/entity views out of an
/// inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The body is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// A segment of the provider-defined nesting is missing.
    #[error("payload is missing '{path}'")]
    MissingField {
        /// Dotted path of the missing segment.
        path: &'static str,
    },

    /// A segment exists but does not have the expected shape.
    #[error("payload field '{path}' is malformed: {reason}")]
    Malformed {
        /// Dotted path of the offending segment.
        path: &'static str,
        /// Deserializer message.
        reason: String,
    },
}

impl ExtractError {
    /// Creates a malformed-field error.
    pub fn malformed(path: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            path,
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
