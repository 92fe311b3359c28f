//! Constructs that drive the interpreter recursively: `@import` and `@each`.

use std::mem;

use tracing::debug;

use crate::Compiled;
use crate::error::CompileError;
use crate::interp::frame::Frame;
use crate::interp::machine::{compile_document, Interpreter, TokenStream};
use crate::interp::substitute::substitute;
use crate::interp::value::{Environment, Value};
use crate::resource::resolve_relative;
use crate::syntax::{Token, TokenKind};

impl Interpreter<'_> {
    /// Compile the document at `relative` and splice its output in place.
    ///
    /// The imported document sees the importer's current bindings.
    pub(super) fn import(&mut self, relative: &str, env: &Environment) -> Result<(), CompileError> {
        let path = resolve_relative(&self.path, relative);
        if self.chain.contains(&path) {
            let mut chain = self.chain.clone();
            chain.push(path);
            return Err(CompileError::ImportCycle { chain });
        }

        let source = self
            .resources
            .read_text(&path)
            .map_err(|source| CompileError::resource(&path, source))?;
        debug!(path = %path.display(), depth = self.chain.len(), "importing");

        let imported = compile_document(self.resources, &path, &source, env, &self.chain)?;
        self.output.html.push_str(&imported.html);
        self.output.css.push_str(&imported.css);
        debug!(path = %path.display(), html = imported.html.len(), "import finished");
        Ok(())
    }

    /// Run a loop body once per entry.
    ///
    /// The body is buffered from `tokens` up to its balancing `}` and replayed
    /// for each entry with the loop variables layered over `env`. Each
    /// iteration's HTML has its interpolation markers resolved against that
    /// iteration's bindings; CSS is appended untouched.
    pub(super) fn run_each(
        &mut self,
        variables: Vec<String>,
        entries: Vec<Value>,
        tokens: &mut TokenStream<'_>,
        env: &Environment,
    ) -> Result<(), CompileError> {
        check_arity(&variables, &entries)?;
        let body = self.buffer_body(tokens)?;
        debug!(
            variables = ?variables,
            entries = entries.len(),
            body_tokens = body.len(),
            "running @each"
        );

        let iterations = entries.len();
        let mut html = String::new();
        let mut css = String::new();
        for entry in entries {
            let child = env.extend(bind(&variables, entry)?);
            let fragment = self.replay(&body, &child)?;
            html.push_str(&substitute(&fragment.html, &child)?);
            css.push_str(&fragment.css);
        }

        self.output.html.push_str(&html);
        self.output.css.push_str(&css);
        self.frame = Frame::Empty;
        debug!(iterations, html = html.len(), "@each finished");
        Ok(())
    }

    /// Collect tokens up to and including the `}` that balances the body.
    fn buffer_body(&self, tokens: &mut TokenStream<'_>) -> Result<Vec<Token>, CompileError> {
        let mut body = Vec::new();
        let mut depth: isize = 0;
        for token in tokens {
            let token = token?;
            match token.kind {
                TokenKind::LCurly | TokenKind::CssRawBegin => depth += 1,
                TokenKind::RCurly => depth -= 1,
                _ => {}
            }
            let closed = token.kind == TokenKind::RCurly && depth <= 0;
            body.push(token);
            if closed {
                return Ok(body);
            }
        }
        Err(self.incomplete("@each body is not closed"))
    }

    /// Interpret `body` in a fresh output buffer and return what it produced.
    fn replay(&mut self, body: &[Token], env: &Environment) -> Result<Compiled, CompileError> {
        let saved = mem::take(&mut self.output);
        self.push(Frame::EachLoopBody);
        let depth = self.depth();

        let mut replayed = body.iter().cloned().map(Ok::<Token, CompileError>);
        self.run(&mut replayed, env)?;

        if self.depth() != depth || !matches!(self.frame, Frame::Empty) {
            return Err(self.incomplete("@each body must be a single `{ ... }` block"));
        }
        self.pop();
        Ok(mem::replace(&mut self.output, saved))
    }
}

/// Fail before iterating if any entry is too short for the declared variables.
fn check_arity(variables: &[String], entries: &[Value]) -> Result<(), CompileError> {
    let minimum = entries
        .iter()
        .map(|entry| match entry {
            Value::List(items) => items.len(),
            _ => 1,
        })
        .min();
    match minimum {
        Some(minimum) if variables.len() > minimum => Err(CompileError::Range {
            variables: variables.len(),
            minimum,
        }),
        _ => Ok(()),
    }
}

/// Bind one entry to the loop variables.
///
/// A single variable takes the whole entry; several variables destructure a
/// list positionally.
fn bind(variables: &[String], entry: Value) -> Result<Vec<(String, Value)>, CompileError> {
    if let [name] = variables {
        return Ok(vec![(name.clone(), entry)]);
    }
    match entry {
        Value::List(items) => Ok(variables.iter().cloned().zip(items).collect()),
        other => Err(CompileError::type_error(format!(
            "cannot destructure {} variables from a {}",
            variables.len(),
            other.type_name()
        ))),
    }
}
