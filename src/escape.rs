//! HTML escaping for text content and attribute values.

/// Replace the characters HTML reserves (`<`, `>`, `&`, `"`) with entities.
///
/// Single quotes are left alone: every attribute is emitted double-quoted.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_html("hello world"), "hello world");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_reserved_characters() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn test_single_quote_and_interpolation_markers_survive() {
        assert_eq!(escape_html("it's"), "it's");
        assert_eq!(escape_html("#{$name}"), "#{$name}");
    }

    #[test]
    fn test_already_escaped_is_escaped_again() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }
}
