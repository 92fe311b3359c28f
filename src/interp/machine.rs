//! The context-stack machine.
//!
//! [`Interpreter`] consumes tokens one at a time. The current frame decides what
//! each token means; opening tokens push a frame, closing tokens pop one, and
//! HTML/CSS is appended to the interpreter's own [`Compiled`] buffers as a side
//! effect. No syntax tree is built.
//!
//! The frame stack is split into `frame` (the top, always present) and
//! `parents`, so there is no empty-stack state to guard against.

use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::Compiled;
use crate::error::{CompileError, Found, SyntaxError};
use crate::escape::escape_html;
use crate::interp::frame::{
    AttributeFrame, ContentStep, Frame, ImportStep, SelectorFrame, CONTENT_KEYWORD,
};
use crate::interp::value::Environment;
use crate::resource::{resolve_relative, Resources};
use crate::syntax::literal::{decode_single_quoted, decode_string, dedent_multiline};
use crate::syntax::{Token, TokenKind, Tokenizer};

/// A source of tokens: a live tokenizer or a buffered loop body.
pub type TokenStream<'t> = dyn Iterator<Item = Result<Token, CompileError>> + 't;

/// Compile one document's source text.
///
/// `parents` lists the documents that (transitively) import this one, outermost
/// first; it is used to detect import cycles.
pub(crate) fn compile_document(
    resources: &dyn Resources,
    path: &Path,
    source: &str,
    env: &Environment,
    parents: &[PathBuf],
) -> Result<Compiled, CompileError> {
    let mut chain = parents.to_vec();
    chain.push(path.to_path_buf());

    let mut interpreter = Interpreter::new(resources, path, chain);
    let mut tokens = Tokenizer::new(source).map(|token| token.map_err(CompileError::from));
    interpreter.run(&mut tokens, env)?;
    interpreter.finish()
}

/// Interpreter state for one document.
pub struct Interpreter<'r> {
    pub(super) resources: &'r dyn Resources,
    /// Document being compiled; relative paths resolve against its directory.
    pub(super) path: PathBuf,
    /// Import chain ending with `path`.
    pub(super) chain: Vec<PathBuf>,
    pub(super) frame: Frame,
    pub(super) parents: Vec<Frame>,
    pub(super) output: Compiled,
}

impl<'r> Interpreter<'r> {
    pub fn new(resources: &'r dyn Resources, path: &Path, chain: Vec<PathBuf>) -> Self {
        Self {
            resources,
            path: path.to_path_buf(),
            chain,
            frame: Frame::Empty,
            parents: Vec::new(),
            output: Compiled::default(),
        }
    }

    /// Number of frames on the stack, including the current one.
    pub fn depth(&self) -> usize {
        self.parents.len() + 1
    }

    /// Consume every token from `tokens`.
    pub fn run(
        &mut self,
        tokens: &mut TokenStream<'_>,
        env: &Environment,
    ) -> Result<(), CompileError> {
        while let Some(token) = tokens.next() {
            let token = token?;
            self.step(token, tokens, env)?;
        }
        Ok(())
    }

    /// Check that the input ended between statements and hand back the output.
    pub fn finish(self) -> Result<Compiled, CompileError> {
        if !self.parents.is_empty() {
            return Err(self.incomplete(format!(
                "unbalanced braces: {} block(s) still open",
                self.parents.len()
            )));
        }
        if !matches!(self.frame, Frame::Empty) {
            return Err(self.incomplete("unterminated statement"));
        }
        Ok(self.output)
    }

    // ── Stack ────────────────────────────────────────────────────────

    pub(super) fn push(&mut self, frame: Frame) {
        let parent = mem::replace(&mut self.frame, frame);
        self.parents.push(parent);
    }

    /// Drop the current frame, making its parent current.
    pub(super) fn pop(&mut self) -> Option<Frame> {
        let parent = self.parents.pop()?;
        Some(mem::replace(&mut self.frame, parent))
    }

    // ── Errors ───────────────────────────────────────────────────────

    pub(super) fn reject(&self, token: &Token, message: impl Into<String>) -> CompileError {
        SyntaxError {
            path: self.path.clone(),
            found: Found::Token {
                kind: token.kind,
                text: token.text.clone(),
            },
            frame: self.frame.describe(),
            message: message.into(),
        }
        .into()
    }

    pub(super) fn incomplete(&self, message: impl Into<String>) -> CompileError {
        SyntaxError {
            path: self.path.clone(),
            found: Found::EndOfInput,
            frame: self.frame.describe(),
            message: message.into(),
        }
        .into()
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn step(
        &mut self,
        token: Token,
        tokens: &mut TokenStream<'_>,
        env: &Environment,
    ) -> Result<(), CompileError> {
        trace!(kind = %token.kind, text = ?token.text, frame = %self.frame.describe(), "token");

        match token.kind {
            TokenKind::Comment => Ok(()),
            TokenKind::Whitespace => {
                match &mut self.frame {
                    Frame::Selector(selector) => selector.saw_whitespace = true,
                    Frame::RawCss { buffer, .. } => buffer.push(' '),
                    _ => {}
                }
                Ok(())
            }
            TokenKind::TagName => self.on_name(&token),
            TokenKind::ClassName => self.on_class(&token),
            TokenKind::IdName => self.on_id(&token),
            TokenKind::LBracket => self.on_lbracket(&token),
            TokenKind::Equal => self.on_equal(&token),
            TokenKind::RBracket => self.on_rbracket(&token),
            TokenKind::String | TokenKind::MultilineString => self.on_string(&token, env),
            TokenKind::LCurly => self.on_lcurly(&token),
            TokenKind::RCurly => self.on_rcurly(&token),
            TokenKind::Semicolon => self.on_semicolon(&token),
            TokenKind::Colon => self.on_colon(&token),
            TokenKind::Separator => match &mut self.frame {
                Frame::RawCss { buffer, .. } => {
                    buffer.push(',');
                    Ok(())
                }
                Frame::Each { .. } => Ok(()),
                _ => Err(self.reject(&token, "`,` is only valid in @each or raw css")),
            },
            TokenKind::Import => match self.frame {
                Frame::Empty => {
                    self.frame = Frame::Import(ImportStep::Path);
                    Ok(())
                }
                _ => Err(self.reject(&token, "@import cannot be used inside another construct")),
            },
            TokenKind::Each => match self.frame {
                Frame::Empty => {
                    self.frame = Frame::Each {
                        variables: Vec::new(),
                    };
                    Ok(())
                }
                _ => Err(self.reject(&token, "@each cannot be used inside another construct")),
            },
            TokenKind::Variable => match &mut self.frame {
                Frame::Each { variables } => {
                    variables.push(token.text);
                    Ok(())
                }
                _ => Err(self.reject(&token, "variables are only valid after @each")),
            },
            TokenKind::In => self.on_in(&token),
            TokenKind::ImportFunc => self.on_import_func(&token, tokens, env),
            TokenKind::MapGet => self.on_map_get(&token, tokens, env),
            TokenKind::CssRawBegin => match self.frame {
                Frame::Empty => {
                    self.frame = Frame::RawCss {
                        depth: 1,
                        buffer: String::new(),
                    };
                    Ok(())
                }
                _ => Err(self.reject(&token, "css blocks cannot be used inside another construct")),
            },
            TokenKind::AnythingElse => match &mut self.frame {
                Frame::RawCss { buffer, .. } => {
                    buffer.push_str(&token.text);
                    Ok(())
                }
                _ => Err(self.reject(&token, "raw text is only valid inside a css block")),
            },
            TokenKind::LParen | TokenKind::RParen => {
                Err(self.reject(&token, "parentheses are not supported here"))
            }
        }
    }

    /// A bare word: tag name, attribute name/value, or `content`.
    fn on_name(&mut self, token: &Token) -> Result<(), CompileError> {
        let message = match &mut self.frame {
            Frame::Empty if token.text == CONTENT_KEYWORD => {
                self.frame = Frame::Content(ContentStep::AfterKeyword);
                return Ok(());
            }
            Frame::Empty => {
                self.frame = Frame::Selector(SelectorFrame::with_tag(token.text.clone()));
                return Ok(());
            }
            Frame::Selector(selector) if selector.tag_name.is_none() => {
                selector.tag_name = Some(token.text.clone());
                return Ok(());
            }
            Frame::Selector(_) => "tag name already set",
            Frame::Attribute(attribute) => match attribute {
                AttributeFrame::Name => {
                    *attribute = AttributeFrame::PostName {
                        name: token.text.clone(),
                    };
                    return Ok(());
                }
                AttributeFrame::Value { name } => {
                    let name = mem::take(name);
                    *attribute = AttributeFrame::End {
                        name,
                        value: token.text.clone(),
                    };
                    return Ok(());
                }
                _ => "attribute already complete",
            },
            _ => "a name is not valid here",
        };
        Err(self.reject(token, message))
    }

    fn on_class(&mut self, token: &Token) -> Result<(), CompileError> {
        if matches!(self.frame, Frame::Empty) {
            self.frame = Frame::Selector(SelectorFrame::default());
        }
        match &mut self.frame {
            Frame::Selector(selector) => {
                selector.classes.push(token.text[1..].to_string());
                Ok(())
            }
            _ => Err(self.reject(token, "class names are only valid in a selector")),
        }
    }

    fn on_id(&mut self, token: &Token) -> Result<(), CompileError> {
        if matches!(self.frame, Frame::Empty) {
            self.frame = Frame::Selector(SelectorFrame::default());
        }
        let message = match &mut self.frame {
            Frame::Selector(selector) if selector.id.is_none() => {
                selector.id = Some(token.text[1..].to_string());
                return Ok(());
            }
            Frame::Selector(_) => "id already set",
            _ => "ids are only valid in a selector",
        };
        Err(self.reject(token, message))
    }

    fn on_lbracket(&mut self, token: &Token) -> Result<(), CompileError> {
        if matches!(self.frame, Frame::Empty) {
            self.frame = Frame::Selector(SelectorFrame::default());
        }
        match self.frame {
            Frame::Selector(_) => {
                self.push(Frame::Attribute(AttributeFrame::Name));
                Ok(())
            }
            _ => Err(self.reject(token, "`[` is only valid in a selector")),
        }
    }

    fn on_equal(&mut self, token: &Token) -> Result<(), CompileError> {
        let message = match &mut self.frame {
            Frame::Attribute(attribute) => match attribute {
                AttributeFrame::PostName { name } => {
                    let name = mem::take(name);
                    *attribute = AttributeFrame::Value { name };
                    return Ok(());
                }
                _ => "`=` must follow an attribute name",
            },
            _ => "`=` is only valid in an attribute",
        };
        Err(self.reject(token, message))
    }

    fn on_rbracket(&mut self, token: &Token) -> Result<(), CompileError> {
        let attribute = match &self.frame {
            Frame::Attribute(AttributeFrame::PostName { name }) => (name.clone(), None),
            Frame::Attribute(AttributeFrame::End { name, value }) => {
                (name.clone(), Some(value.clone()))
            }
            Frame::Attribute(_) => {
                return Err(self.reject(token, "`]` must follow an attribute name or value"))
            }
            _ => return Err(self.reject(token, "`]` is only valid in an attribute")),
        };
        self.pop();
        match &mut self.frame {
            Frame::Selector(selector) => {
                selector.attributes.push(attribute);
                Ok(())
            }
            _ => Err(self.reject(token, "attribute outside a selector")),
        }
    }

    fn on_string(&mut self, token: &Token, env: &Environment) -> Result<(), CompileError> {
        if let Frame::RawCss { buffer, .. } = &mut self.frame {
            buffer.push_str(&token.text);
            return Ok(());
        }

        let value = match token.kind {
            TokenKind::MultilineString => dedent_multiline(&token.text),
            _ => decode_string(&token.text)
                .ok_or_else(|| self.reject(token, "invalid string literal"))?,
        };

        let message = match &mut self.frame {
            Frame::Attribute(attribute) => match attribute {
                AttributeFrame::Value { name } => {
                    let name = mem::take(name);
                    *attribute = AttributeFrame::End { name, value };
                    return Ok(());
                }
                _ => "a string must follow `=`",
            },
            Frame::Content(step) => match step {
                ContentStep::Value => {
                    self.output.html.push_str(&escape_html(&value));
                    *step = ContentStep::End;
                    return Ok(());
                }
                _ => "a string must follow `content:`",
            },
            Frame::Import(ImportStep::Path) => {
                self.import(&value, env)?;
                self.frame = Frame::Import(ImportStep::End);
                return Ok(());
            }
            Frame::Import(_) => "import path already given",
            _ => "a string is not valid here",
        };
        Err(self.reject(token, message))
    }

    fn on_lcurly(&mut self, token: &Token) -> Result<(), CompileError> {
        match &mut self.frame {
            Frame::Selector(selector) => {
                trace!(selector = %selector, spaced = selector.saw_whitespace, "open element");
                let open = selector.open_tag();
                self.output.html.push_str(&open);
                self.push(Frame::Empty);
                Ok(())
            }
            Frame::EachLoopBody => {
                self.push(Frame::Empty);
                Ok(())
            }
            Frame::RawCss { depth, buffer } => {
                buffer.push('{');
                *depth += 1;
                Ok(())
            }
            _ => Err(self.reject(token, "`{` is not valid here")),
        }
    }

    fn on_rcurly(&mut self, token: &Token) -> Result<(), CompileError> {
        match &mut self.frame {
            Frame::RawCss { depth, buffer } => {
                *depth -= 1;
                if *depth == 0 {
                    let css = buffer.trim();
                    debug!(bytes = css.len(), "raw css block closed");
                    self.output.css.push_str(css);
                    self.frame = Frame::Empty;
                } else {
                    buffer.push('}');
                }
                return Ok(());
            }
            Frame::Empty => {}
            _ => return Err(self.reject(token, "`}` before the statement is complete")),
        }

        let Some(parent) = self.parents.last() else {
            return Err(self.reject(token, "unmatched `}`"));
        };
        match parent {
            Frame::Selector(selector) => {
                let close = selector.close_tag();
                self.output.html.push_str(&close);
            }
            Frame::EachLoopBody => {}
            _ => return Err(self.reject(token, "`}` does not close a block")),
        }
        self.pop();
        self.frame = Frame::Empty;
        Ok(())
    }

    fn on_semicolon(&mut self, token: &Token) -> Result<(), CompileError> {
        match &mut self.frame {
            Frame::Selector(selector) => {
                let open = selector.open_tag();
                self.output.html.push_str(&open);
                self.frame = Frame::Empty;
                Ok(())
            }
            Frame::Content(ContentStep::End) | Frame::Import(ImportStep::End) => {
                self.frame = Frame::Empty;
                Ok(())
            }
            Frame::RawCss { buffer, .. } => {
                buffer.push(';');
                Ok(())
            }
            Frame::Content(_) => Err(self.reject(token, "`;` must follow the content string")),
            Frame::Import(_) => Err(self.reject(token, "`;` must follow the import path")),
            _ => Err(self.reject(token, "`;` is not valid here")),
        }
    }

    fn on_colon(&mut self, token: &Token) -> Result<(), CompileError> {
        match &mut self.frame {
            Frame::Content(step @ ContentStep::AfterKeyword) => {
                *step = ContentStep::Value;
                Ok(())
            }
            Frame::RawCss { buffer, .. } => {
                buffer.push(':');
                Ok(())
            }
            Frame::Content(_) => Err(self.reject(token, "`:` must follow `content`")),
            _ => Err(self.reject(token, "`:` is not valid here")),
        }
    }

    fn on_in(&mut self, token: &Token) -> Result<(), CompileError> {
        match &mut self.frame {
            Frame::Each { variables } if !variables.is_empty() => {
                let variables = mem::take(variables);
                self.frame = Frame::EachSource { variables };
                Ok(())
            }
            Frame::Each { .. } => Err(self.reject(token, "need at least one variable before `in`")),
            _ => Err(self.reject(token, "`in` is only valid in @each")),
        }
    }

    /// `import("data.yml")` as an @each source.
    fn on_import_func(
        &mut self,
        token: &Token,
        tokens: &mut TokenStream<'_>,
        env: &Environment,
    ) -> Result<(), CompileError> {
        let Frame::EachSource { variables } = &self.frame else {
            return Err(self.reject(token, "import() is only valid after `in`"));
        };
        let variables = variables.clone();

        let relative = token
            .group(0)
            .and_then(decode_string)
            .ok_or_else(|| self.reject(token, "invalid import() path"))?;
        let path = resolve_relative(&self.path, &relative);
        let data = self
            .resources
            .read_structured(&path)
            .map_err(|source| CompileError::resource(&path, source))?;
        debug!(path = %path.display(), "loaded @each data");

        self.run_each(variables, data.entries()?, tokens, env)
    }

    /// `map.get($var, 'key')` as an @each source.
    fn on_map_get(
        &mut self,
        token: &Token,
        tokens: &mut TokenStream<'_>,
        env: &Environment,
    ) -> Result<(), CompileError> {
        let Frame::EachSource { variables } = &self.frame else {
            return Err(self.reject(token, "map.get() is only valid after `in`"));
        };
        let variables = variables.clone();

        let (Some(name), Some(key)) = (
            token.group(0),
            token.group(1).and_then(decode_single_quoted),
        ) else {
            return Err(self.reject(token, "invalid map.get() arguments"));
        };
        let entries = env
            .require(name)?
            .get(&key)?
            .ok_or_else(|| CompileError::reference(format!("'{key}' in {name}")))?
            .entries()?;

        self.run_each(variables, entries, tokens, env)
    }
}
