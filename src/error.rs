//! Error taxonomy for compilation.
//!
//! Every error is fatal: compilation stops at the first one and no output is
//! produced. The variants carry enough context (frame, position, remaining
//! input) to find the problem, not to recover from it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::syntax::TokenKind;

/// How much unconsumed input a [`LexError`] shows when displayed.
const REMAINING_PREVIEW: usize = 60;

/// Any failure while compiling a document.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("reference error: {name} is not defined")]
    Reference { name: String },

    #[error("type error: {message}")]
    Type { message: String },

    #[error("range error: cannot destructure {variables} variables from a list of at minimum {minimum} items")]
    Range { variables: usize, minimum: usize },

    #[error("import cycle: {}", display_chain(.chain))]
    ImportCycle { chain: Vec<PathBuf> },

    #[error("cannot read {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: ResourceError,
    },
}

impl CompileError {
    pub(crate) fn reference(name: impl Into<String>) -> Self {
        CompileError::Reference { name: name.into() }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        CompileError::Type {
            message: message.into(),
        }
    }

    /// Wrap a failure to load `path`. Data whose shape cannot become a value
    /// is a type error rather than a resource failure.
    pub(crate) fn resource(path: &Path, source: ResourceError) -> Self {
        match source {
            ResourceError::UnsupportedKey => CompileError::type_error(format!(
                "{}: {}",
                path.display(),
                ResourceError::UnsupportedKey
            )),
            source => CompileError::Resource {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// No rule of the active grammar matches at the current position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot tokenize from here ({grammar} grammar, line {line}, column {column}): {}", preview(.remaining))]
pub struct LexError {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
    /// Name of the grammar on top of the stack.
    pub grammar: &'static str,
    /// All input from `offset` on.
    pub remaining: String,
}

impl LexError {
    pub(crate) fn new(source: &str, offset: usize, grammar: &'static str) -> Self {
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            line,
            column,
            grammar,
            remaining: source[offset..].to_string(),
        }
    }
}

fn preview(remaining: &str) -> String {
    match remaining.char_indices().nth(REMAINING_PREVIEW) {
        Some((cut, _)) => format!("{:?}...", &remaining[..cut]),
        None => format!("{remaining:?}"),
    }
}

/// A token that is not legal in the current context frame, or input that ends
/// in the middle of a construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message} (found {found} in {frame})", .path.display())]
pub struct SyntaxError {
    /// Document being compiled.
    pub path: PathBuf,
    pub found: Found,
    /// Description of the offending frame.
    pub frame: String,
    pub message: String,
}

/// What the interpreter was looking at when a [`SyntaxError`] happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Token { kind: TokenKind, text: String },
    EndOfInput,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Token { kind, text } => write!(f, "{kind} {text:?}"),
            Found::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Failure of the resource layer.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("data has a non-scalar mapping key")]
    UnsupportedKey,

    #[error("no such resource")]
    NotFound,
}
