//! Prompt validation and sanitization.
//!
//! The sanitizer neutralizes markup before the prompt crosses the wire.
//! It must be idempotent: a prompt that already went through it comes
//! out unchanged, so double-sanitizing at different layers is harmless.

use crate::error::RelayError;

/// Entities produced by [`sanitize`]. A `&` that already begins one of
/// these is copied verbatim instead of being re-escaped.
const OWN_ENTITIES: [&str; 8] = [
    "amp;", "lt;", "gt;", "quot;", "#x27;", "#x2F;", "#x5C;", "#96;",
];

/// Validate a raw prompt before any network activity.
///
/// Rejects empty or whitespace-only text, and text containing control
/// characters other than newline, carriage return, and tab.
pub fn validate(raw: &str) -> Result<(), RelayError> {
    if raw.trim().is_empty() {
        return Err(RelayError::InvalidPrompt(
            "prompt must be a non-empty string".to_string(),
        ));
    }
    if raw
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(RelayError::InvalidPrompt(
            "prompt contains non-textual control characters".to_string(),
        ));
    }
    Ok(())
}

/// Escape markup-significant characters with HTML entities.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)` for all `x`,
/// because an ampersand that already starts one of our own entities is
/// left alone.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '&' => {
                if OWN_ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty() {
        assert!(validate("").is_err());
        assert!(validate("   \n\t ").is_err());
    }

    #[test]
    fn validate_rejects_control_characters() {
        assert!(validate("hello\u{0}world").is_err());
        assert!(validate("bell\u{7}").is_err());
    }

    #[test]
    fn validate_accepts_multiline_text() {
        assert!(validate("a cat\nin a hat\t(watercolor)").is_ok());
    }

    #[test]
    fn sanitize_escapes_markup() {
        assert_eq!(
            sanitize("<img src=\"x\">"),
            "&lt;img src=&quot;x&quot;&gt;"
        );
        assert_eq!(sanitize("a & b"), "a &amp; b");
        assert_eq!(sanitize("it's"), "it&#x27;s");
        assert_eq!(sanitize("a/b\\c`d"), "a&#x2F;b&#x5C;c&#96;d");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "plain text",
            "<script>alert('x')</script>",
            "fish & chips & more",
            "already &amp; escaped",
            "mixed &amp; <raw> input",
            "`back/slash\\ticks`",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn sanitize_leaves_unicode_alone() {
        assert_eq!(sanitize("émoji 🎨 ok"), "émoji 🎨 ok");
    }
}
