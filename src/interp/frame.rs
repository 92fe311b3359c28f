//! Context frames: what the interpreter is in the middle of building.

use std::fmt;

use crate::escape::escape_html;

/// Tag name used when a selector omits one.
pub const DEFAULT_TAG: &str = "div";

/// The reserved word that starts an inline text statement.
pub const CONTENT_KEYWORD: &str = "content";

/// One entry of the interpreter's context stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Awaiting a construct. Also the frame for an element or loop body.
    Empty,
    /// `tag.class#id[attr]`, until `{` or `;`.
    Selector(SelectorFrame),
    /// `[name]` or `[name=value]` inside a selector.
    Attribute(AttributeFrame),
    /// `content: "text";`
    Content(ContentStep),
    /// `@import "path";`
    Import(ImportStep),
    /// `@each $a, $b in source`, until the source is resolved.
    Each { variables: Vec<String> },
    /// `@each $a in` with the variable list closed, awaiting the source.
    EachSource { variables: Vec<String> },
    /// Marks the scope of one loop iteration's body.
    EachLoopBody,
    /// Verbatim capture inside `css { ... }`.
    RawCss { depth: usize, buffer: String },
}

impl Frame {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Frame::Empty => "empty context".to_string(),
            Frame::Selector(selector) => format!("selector `{selector}`"),
            Frame::Attribute(attribute) => format!("attribute ({})", attribute.step_name()),
            Frame::Content(step) => format!("content statement ({step:?})"),
            Frame::Import(step) => format!("import statement ({step:?})"),
            Frame::Each { variables } => format!("@each clause [{}]", variables.join(", ")),
            Frame::EachSource { variables } => {
                format!("@each source for [{}]", variables.join(", "))
            }
            Frame::EachLoopBody => "@each loop body".to_string(),
            Frame::RawCss { depth, .. } => format!("raw css block (depth {depth})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A selector statement under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorFrame {
    pub tag_name: Option<String>,
    /// Class names without the leading `.`, in source order.
    pub classes: Vec<String>,
    /// Id without the leading `#`.
    pub id: Option<String>,
    /// Explicit `[name=value]` attributes; `None` renders a bare name.
    pub attributes: Vec<(String, Option<String>)>,
    /// Whitespace appeared somewhere inside the selector.
    pub saw_whitespace: bool,
}

impl SelectorFrame {
    /// A selector with a tag name.
    pub fn with_tag(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: Some(tag_name.into()),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        self.tag_name.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// Render `<tag class=".." id=".." attr="..">`.
    ///
    /// Classes come first as one space-joined attribute, then the id, then
    /// explicit attributes in source order. Values are HTML-escaped.
    pub fn open_tag(&self) -> String {
        let mut html = format!("<{}", self.tag());
        if !self.classes.is_empty() {
            push_attribute(&mut html, "class", Some(&self.classes.join(" ")));
        }
        if let Some(id) = &self.id {
            push_attribute(&mut html, "id", Some(id));
        }
        for (name, value) in &self.attributes {
            push_attribute(&mut html, name, value.as_deref());
        }
        html.push('>');
        html
    }

    /// Render `</tag>`.
    pub fn close_tag(&self) -> String {
        format!("</{}>", self.tag())
    }
}

fn push_attribute(html: &mut String, name: &str, value: Option<&str>) {
    html.push(' ');
    html.push_str(name);
    if let Some(value) = value {
        html.push_str("=\"");
        html.push_str(&escape_html(value));
        html.push('"');
    }
}

impl fmt::Display for SelectorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag_name {
            f.write_str(tag)?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for (name, value) in &self.attributes {
            match value {
                Some(value) => write!(f, "[{name}={value:?}]")?,
                None => write!(f, "[{name}]")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statement steps
// ---------------------------------------------------------------------------

/// Progress through `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeFrame {
    /// After `[`.
    Name,
    /// After the name; `=` or `]` may follow.
    PostName { name: String },
    /// After `=`.
    Value { name: String },
    /// After the value; only `]` may follow.
    End { name: String, value: String },
}

impl AttributeFrame {
    fn step_name(&self) -> &'static str {
        match self {
            AttributeFrame::Name => "expecting name",
            AttributeFrame::PostName { .. } => "after name",
            AttributeFrame::Value { .. } => "expecting value",
            AttributeFrame::End { .. } => "after value",
        }
    }
}

/// Progress through `content: "text";`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStep {
    AfterKeyword,
    Value,
    End,
}

/// Progress through `@import "path";`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStep {
    Path,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_tag_attribute_order() {
        let selector = SelectorFrame {
            tag_name: Some("a".into()),
            classes: vec!["nav".into(), "active".into()],
            id: Some("home".into()),
            attributes: vec![("href".into(), Some("/?a=1&b=2".into()))],
            saw_whitespace: false,
        };
        assert_eq!(
            selector.open_tag(),
            r#"<a class="nav active" id="home" href="/?a=1&amp;b=2">"#
        );
        assert_eq!(selector.close_tag(), "</a>");
    }

    #[test]
    fn test_default_tag_and_bare_attribute() {
        let selector = SelectorFrame {
            attributes: vec![("hidden".into(), None)],
            ..SelectorFrame::default()
        };
        assert_eq!(selector.open_tag(), "<div hidden>");
        assert_eq!(selector.close_tag(), "</div>");
    }

    #[test]
    fn test_no_class_or_id_attribute_when_absent() {
        assert_eq!(SelectorFrame::with_tag("p").open_tag(), "<p>");
    }

    #[test]
    fn test_selector_display() {
        let selector = SelectorFrame {
            tag_name: Some("input".into()),
            classes: vec!["x".into()],
            id: None,
            attributes: vec![("type".into(), Some("text".into())), ("required".into(), None)],
            saw_whitespace: true,
        };
        assert_eq!(selector.to_string(), r#"input.x[type="text"][required]"#);
    }
}
