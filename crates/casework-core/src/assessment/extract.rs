//! Locating the JSON object inside free-form model output.

/// Return the first balanced `{...}` object in `text`.
///
/// Scanning starts at the first `{` and stops at its matching `}`. Braces
/// inside string literals (including escaped quotes) are ignored. Returns
/// `None` when there is no `{` or it is never closed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_bare_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_ignores_prose_and_trailing_objects() {
        let text = r#"Sure! {"a":{"b":2}} and also {"c":3}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a":{"b":2}}"#));
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"feedback":"use {curly} braces \"}\" carefully"} tail"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"feedback":"use {curly} braces \"}\" carefully"}"#)
        );
    }

    #[test]
    fn test_unclosed_or_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(r#"{"a": {"b": 1}"#), None);
    }

    #[test]
    fn test_multibyte_content() {
        let text = "Résultat 🎓 {\"note\":\"très bien 🎓\"} fin";
        assert_eq!(extract_json_object(text), Some("{\"note\":\"très bien 🎓\"}"));
    }
}
