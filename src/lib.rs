//! # imitation-scss
//!
//! Compiles an SCSS-flavored page language into one HTML document and one CSS
//! stylesheet.
//!
//! Selectors become elements (`a.nav#home[href="/"] { ... }`), `content: "..."`
//! becomes escaped text, `css { ... }` blocks are copied into the stylesheet,
//! `@import "part.scss";` splices another document in place, and
//! `@each $a, $b in import("data.yml") { ... }` repeats a body once per data
//! entry with `#{$a}` markers resolved in the produced HTML.
//!
//! There is no syntax tree. A grammar-stack tokenizer feeds a context-stack
//! interpreter that appends output as it goes.
//!
//! ## Core Systems
//!
//! - **[`syntax`]**: Tokens, the three lexical grammars, the tokenizer, literal decoding
//! - **[`interp`]**: Context frames, the stack machine, substitution, imports and loops
//! - **[`resource`]**: Where imported documents and data files come from
//! - **[`config`]**: Initial variable bindings
//! - **[`error`]**: Error taxonomy
//! - **[`escape`]**: HTML escaping
//!
//! ```
//! use imitation_scss::{compile_str, CompileOptions, MemoryResources};
//!
//! let out = compile_str(
//!     "p.lead { content: \"Hi\"; }",
//!     "index.scss",
//!     &MemoryResources::new(),
//!     &CompileOptions::new(),
//! )
//! .unwrap();
//! assert_eq!(out.html, r#"<p class="lead">Hi</p>"#);
//! ```

use std::path::Path;

use tracing::debug;

// Foundation
pub mod error;
pub mod escape;

// Lexing and interpretation
pub mod interp;
pub mod syntax;

// Environment
pub mod config;
pub mod resource;

pub use config::CompileOptions;
pub use error::{CompileError, Found, LexError, ResourceError, SyntaxError};
pub use interp::{Environment, Value};
pub use resource::{FileSystem, MemoryResources, Resources};

/// Output of one compilation: an HTML fragment and a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub html: String,
    pub css: String,
}

impl Compiled {
    /// The HTML output as a complete document, naming its source.
    pub fn html_document(&self, input: &Path) -> String {
        format!(
            "<!DOCTYPE html>{}\n<!-- Generated from {} -->\n",
            self.html,
            input.display()
        )
    }

    /// The CSS output as a complete stylesheet, naming its source.
    pub fn css_document(&self, input: &Path) -> String {
        format!("{}\n/* Generated from {} */\n", self.css, input.display())
    }
}

/// Compile `source` as if it were the document at `path`.
///
/// `path` is only used to resolve relative imports and data files and to label
/// errors; it does not need to exist.
pub fn compile_str(
    source: &str,
    path: impl AsRef<Path>,
    resources: &dyn Resources,
    options: &CompileOptions,
) -> Result<Compiled, CompileError> {
    let path = resource::normalize(path.as_ref());
    debug!(path = %path.display(), bindings = options.variables.len(), "compiling");
    interp::machine::compile_document(resources, &path, source, &options.variables, &[])
}

/// Read the document at `path` from `resources` and compile it.
pub fn compile_file(
    path: impl AsRef<Path>,
    resources: &dyn Resources,
    options: &CompileOptions,
) -> Result<Compiled, CompileError> {
    let path = resource::normalize(path.as_ref());
    let source = resources
        .read_text(&path)
        .map_err(|source| CompileError::resource(&path, source))?;
    compile_str(&source, &path, resources, options)
}
