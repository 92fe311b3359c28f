//! Tokens shared by every grammar.

use std::fmt;

/// The kind of a token, independent of which grammar produced it.
///
/// Several grammars can produce the same kind (both the document grammar and the
/// raw CSS grammar produce [`TokenKind::LCurly`]); the interpreter only cares
/// about the kind and the frame it arrives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Literals ─────────────────────────────────────────────────────
    /// `"""..."""`, dedented when decoded.
    MultilineString,
    /// `"..."` (and `'...'` inside raw CSS).
    String,
    /// `// ...` to end of line.
    Comment,

    // ── Directives ───────────────────────────────────────────────────
    /// `css {`, opens a raw CSS block.
    CssRawBegin,
    /// `@import`
    Import,
    /// `import("path")` on the right-hand side of `@each ... in`.
    ImportFunc,
    /// `@each`
    Each,
    /// `map.get($var, 'key')`
    MapGet,
    /// `in`, ends the variable list of an `@each` clause.
    In,
    /// `$name`
    Variable,

    // ── Selector parts ───────────────────────────────────────────────
    /// `#name`
    IdName,
    /// `.name`
    ClassName,
    /// A bare word: tag name, attribute name/value, or the `content` keyword.
    TagName,

    // ── Punctuation ──────────────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LCurly,
    RCurly,
    Equal,
    Semicolon,
    Colon,
    Separator,

    /// A run of whitespace.
    Whitespace,
    /// Any other run of characters inside raw CSS.
    AnythingElse,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::MultilineString => "multiline string",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::CssRawBegin => "`css {`",
            TokenKind::Import => "`@import`",
            TokenKind::ImportFunc => "import(...)",
            TokenKind::Each => "`@each`",
            TokenKind::MapGet => "map.get(...)",
            TokenKind::In => "`in`",
            TokenKind::Variable => "variable",
            TokenKind::IdName => "id",
            TokenKind::ClassName => "class name",
            TokenKind::TagName => "name",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LCurly => "`{`",
            TokenKind::RCurly => "`}`",
            TokenKind::Equal => "`=`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Separator => "`,`",
            TokenKind::Whitespace => "whitespace",
            TokenKind::AnythingElse => "raw text",
        };
        f.write_str(name)
    }
}

/// A single lexed token: its kind, the exact matched text, and capture groups
/// for the kinds that carry structured payloads ([`TokenKind::ImportFunc`],
/// [`TokenKind::MapGet`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Capture groups, 1-based in the pattern but stored 0-based here.
    pub groups: Vec<String>,
}

impl Token {
    /// Create a token without capture groups.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            groups: Vec::new(),
        }
    }

    /// Attach capture groups (builder).
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// The `index`th capture group (0-based), if present.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).map(String::as_str)
    }
}
