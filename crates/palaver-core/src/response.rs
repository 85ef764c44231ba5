//! Outbound chat response.

use serde::{Deserialize, Serialize};

/// Numeric response-kind discriminator understood by the chat front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseKind(pub u32);

impl ResponseKind {
    /// A plain text reply.
    pub const TEXT: Self = Self(1);
}

impl Default for ResponseKind {
    fn default() -> Self {
        Self::TEXT
    }
}

impl From<u32> for ResponseKind {
    fn from(kind: u32) -> Self {
        Self(kind)
    }
}

/// A chat reply produced by exactly one handler per request.
///
/// Serialized as `{ "text": ..., "type": ..., "speakText": ... }`. The
/// spoken text is omitted on the wire until it is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Text displayed to the user.
    pub text: String,

    /// Response-kind discriminator.
    #[serde(rename = "type", default)]
    pub kind: ResponseKind,

    /// Text read aloud by voice clients.
    #[serde(
        rename = "speakText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub speak_text: Option<String>,
}

impl Response {
    /// Creates a response of the given kind.
    pub fn new(text: impl Into<String>, kind: impl Into<ResponseKind>) -> Self {
        Self {
            text: text.into(),
            kind: kind.into(),
            speak_text: None,
        }
    }

    /// Creates a plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, ResponseKind::TEXT)
    }

    /// Sets an explicit spoken text.
    pub fn with_speak_text(mut self, speak_text: impl Into<String>) -> Self {
        self.speak_text = Some(speak_text.into());
        self
    }
}
