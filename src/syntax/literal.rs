//! Decoding of string literals.

/// Decode a `"..."` literal. Escapes follow JSON string syntax.
///
/// Returns `None` if the literal is not a valid JSON string.
pub fn decode_string(literal: &str) -> Option<String> {
    serde_json::from_str::<String>(literal).ok()
}

/// Decode the body of a `'...'` key as used by `map.get($var, 'key')`.
///
/// `\'` becomes `'`, a bare `"` is kept as is, and every other escape follows
/// JSON string syntax.
pub fn decode_single_quoted(body: &str) -> Option<String> {
    let mut json = String::with_capacity(body.len() + 2);
    json.push('"');
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => json.push_str("\\\""),
            '\\' => match chars.next() {
                Some('\'') => json.push('\''),
                Some(escaped) => {
                    json.push('\\');
                    json.push(escaped);
                }
                None => json.push('\\'),
            },
            _ => json.push(c),
        }
    }
    json.push('"');
    decode_string(&json)
}

/// Dedent a `"""..."""` literal.
///
/// The indentation width is taken from the first line break's following run of
/// spaces and tabs. Every line break, together with the whitespace before it and
/// up to that many spaces or tabs after it, collapses to a single space; the
/// result is then trimmed. Escapes are not interpreted.
pub fn dedent_multiline(literal: &str) -> String {
    let contents = literal
        .strip_prefix("\"\"\"")
        .and_then(|rest| rest.strip_suffix("\"\"\""))
        .unwrap_or(literal);
    let is_indent = |c: char| c == ' ' || c == '\t';
    let width = contents
        .split_once('\n')
        .map_or(0, |(_, rest)| rest.chars().take_while(|&c| is_indent(c)).count());

    let mut out = String::with_capacity(contents.len());
    let mut rest = contents;
    while let Some(start) = rest.find(char::is_whitespace) {
        out.push_str(&rest[..start]);
        let run = &rest[start..];
        let end = run.find(|c: char| !c.is_whitespace()).unwrap_or(run.len());
        let (run, after) = run.split_at(end);
        match run.rfind('\n') {
            Some(last) => {
                let tail = &run[last + 1..];
                let skip: usize = tail
                    .chars()
                    .take(width)
                    .take_while(|&c| is_indent(c))
                    .map(char::len_utf8)
                    .sum();
                out.push(' ');
                out.push_str(&tail[skip..]);
            }
            None => out.push_str(run),
        }
        rest = after;
    }
    out.push_str(rest);
    out.trim().to_string()
}
