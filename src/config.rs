//! Compilation options.

use crate::interp::value::{Environment, Value};

/// Options for one compilation run.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Bindings visible to the top-level document and everything it imports.
    pub variables: Environment,
}

impl CompileOptions {
    /// Create default options (no bindings).
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable (builder). The name includes the `$` sigil.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name, value.into());
        self
    }

    /// Replace all bindings (builder).
    pub fn with_variables(mut self, variables: Environment) -> Self {
        self.variables = variables;
        self
    }
}
