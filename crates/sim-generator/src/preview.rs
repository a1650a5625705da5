//! Compact payload previews for status displays.
//!
//! Text and JSON are shown verbatim up to [`PREVIEW_LIMIT`] characters, with
//! control characters escaped. A JSON string is shown without its quotes.
//! Binary payloads are summarized by size only.

use serde_json::Value;

/// Maximum preview length in characters, ellipsis included.
pub const PREVIEW_LIMIT: usize = 48;

/// Something a payload builder wants to preview.
#[derive(Debug, Clone, Copy)]
pub enum PreviewSource<'a> {
    Text(&'a str),
    Json(&'a Value),
    Bytes(&'a [u8]),
    Pickle(&'a [u8]),
}

/// Render a display-safe preview.
pub fn preview_payload(source: PreviewSource<'_>) -> String {
    match source {
        PreviewSource::Text(text) => truncate_preview(&escape_control(text), PREVIEW_LIMIT),
        PreviewSource::Json(Value::String(text)) => {
            truncate_preview(&escape_control(text), PREVIEW_LIMIT)
        }
        PreviewSource::Json(value) => truncate_preview(&value.to_string(), PREVIEW_LIMIT),
        PreviewSource::Bytes(bytes) => format!("<bytes {}B>", bytes.len()),
        PreviewSource::Pickle(bytes) => format!("<pickle {}B>", bytes.len()),
    }
}

/// Shorten `text` to at most `limit` characters, ending in `...` when cut.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Escape control characters (`\n`, `\t`, `\u{1b}`, ...) so a preview stays on one line.
pub fn escape_control(text: &str) -> String {
    if !text.chars().any(char::is_control) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_long_text_is_truncated() {
        let text = "x".repeat(60);
        let preview = preview_payload(PreviewSource::Text(&text));
        assert_eq!(preview.chars().count(), 48);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_short_text_is_verbatim() {
        assert_eq!(preview_payload(PreviewSource::Text("hello")), "hello");
        let exact = "y".repeat(48);
        assert_eq!(preview_payload(PreviewSource::Text(&exact)), exact);
    }

    #[test]
    fn test_bytes_preview_hides_content() {
        let raw = b"\x00\x01secret";
        let preview = preview_payload(PreviewSource::Bytes(raw));
        assert_eq!(preview, "<bytes 8B>");
        assert!(!preview.contains("secret"));
        assert_eq!(preview_payload(PreviewSource::Pickle(raw)), "<pickle 8B>");
    }

    #[test]
    fn test_json_preview_is_compact() {
        let value = json!({"temp": 21, "ok": true});
        let preview = preview_payload(PreviewSource::Json(&value));
        assert!(preview.starts_with('{'));
        assert!(!preview.contains(' '));
    }

    #[test]
    fn test_json_string_preview_is_unquoted() {
        assert_eq!(preview_payload(PreviewSource::Json(&json!("s"))), "s");
        assert_eq!(preview_payload(PreviewSource::Json(&json!("a\nb"))), "a\\nb");
        assert_eq!(preview_payload(PreviewSource::Json(&json!(3))), "3");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(escape_control("a\nb\tc"), "a\\nb\\tc");
        assert_eq!(preview_payload(PreviewSource::Text("\u{1b}[2J")), "\\u{1b}[2J");
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = "é".repeat(50);
        let preview = truncate_preview(&text, PREVIEW_LIMIT);
        assert_eq!(preview.chars().count(), 48);
    }
}
