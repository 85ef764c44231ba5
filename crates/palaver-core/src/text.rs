//! Text helpers for voice output.

/// Returns `true` for characters that voice clients cannot pronounce.
///
/// Covers the private use area, the emoji and symbol blocks from U+1F000
/// to U+1F7FF, the crossed-swords group U+2694–U+2697 and the face
/// gestures U+1F910–U+1F959.
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0xE000..=0xF8FF | 0x1F000..=0x1F7FF | 0x2694..=0x2697 | 0x1F910..=0x1F959
    )
}

/// Removes every emoji character from `text`, leaving surrounding
/// whitespace untouched.
pub fn strip_emojis(text: &str) -> String {
    text.chars().filter(|&c| !is_emoji(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_emojis() {
        assert_eq!(strip_emojis("Hello 😀 world"), "Hello  world");
        assert_eq!(strip_emojis("Pong! 🏓"), "Pong! ");
        assert_eq!(strip_emojis("\u{2694} duel"), " duel");
        assert_eq!(strip_emojis("🤔"), "");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(strip_emojis("Noticias de Ourense: ñandú"), "Noticias de Ourense: ñandú");
        assert_eq!(strip_emojis(""), "");
    }
}
