//! Interpolation markers: `#{$var}` and `#{map.get($var, 'key')}`.
//!
//! Markers are resolved after a loop iteration has produced its HTML, against
//! that iteration's bindings. Values are HTML-escaped on the way in.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::CompileError;
use crate::escape::escape_html;
use crate::interp::value::{Environment, Value};
use crate::syntax::literal::decode_single_quoted;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"#\{(?:(\$[\w-]+)|map\s*\.\s*get\s*\(\s*(\$[\w-]+)\s*,\s*'((?:[^'\r\n\\]|\\.)*)'\s*\))\}",
    )
    .expect("static regex")
});

/// Replace every marker in `text`, leftmost first.
pub fn substitute(text: &str, env: &Environment) -> Result<String, CompileError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in MARKER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&escape_html(render(resolve(&caps, env)?)?));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn resolve<'e>(caps: &Captures<'_>, env: &'e Environment) -> Result<&'e Value, CompileError> {
    if let Some(name) = caps.get(1) {
        return env.require(name.as_str());
    }
    let (Some(name), Some(key)) = (caps.get(2), caps.get(3)) else {
        return Err(CompileError::type_error("malformed interpolation marker"));
    };
    let key = decode_single_quoted(key.as_str())
        .ok_or_else(|| CompileError::type_error(format!("invalid key '{}'", key.as_str())))?;
    env.require(name.as_str())?
        .get(&key)?
        .ok_or_else(|| CompileError::reference(format!("'{key}' in {}", name.as_str())))
}

fn render(value: &Value) -> Result<&str, CompileError> {
    match value {
        Value::Scalar(text) => Ok(text),
        other => Err(CompileError::type_error(format!(
            "cannot interpolate a {}",
            other.type_name()
        ))),
    }
}
