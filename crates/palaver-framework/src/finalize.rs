//! Response finalization.

use palaver_core::Response;
use palaver_core::text::strip_emojis;

/// Guarantees the spoken text is populated before a response leaves the
/// webhook.
///
/// A missing or empty spoken text is derived from the display text with
/// emoji removed; an explicit one is left untouched. Finalizing twice is a
/// no-op.
pub fn finalize(mut response: Response) -> Response {
    if response.speak_text.as_deref().is_none_or(str::is_empty) {
        response.speak_text = Some(strip_emojis(&response.text));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derives_speak_text_without_emojis() {
        let response = finalize(Response::text("Hello 😀 world"));

        assert_eq!(response.text, "Hello 😀 world");
        assert_eq!(response.speak_text.as_deref(), Some("Hello  world"));
    }

    #[test]
    fn test_keeps_explicit_speak_text() {
        let response = finalize(Response::text("Pong! 🏓").with_speak_text("pong"));

        assert_eq!(response.speak_text.as_deref(), Some("pong"));
    }

    #[test]
    fn test_empty_speak_text_is_replaced() {
        let response = finalize(Response::text("Hi").with_speak_text(""));

        assert_eq!(response.speak_text.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            Response::text("Hello 😀 world"),
            Response::text("🤔"),
            Response::new("Titulares", 4).with_speak_text("Los titulares"),
            Response::text(""),
        ];

        for response in samples {
            let once = finalize(response);
            assert_eq!(finalize(once.clone()), once);
        }
    }
}
