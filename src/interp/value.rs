//! Runtime values and the variable environment.

use std::collections::HashMap;

use crate::error::{CompileError, ResourceError};

/// A value bound to a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent data (YAML `~`). Cannot be substituted.
    Null,
    /// Text, or a number/boolean in its canonical text form.
    Scalar(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Keyed structure, in document order.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Build a scalar.
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(text.into())
    }

    /// Build a list from anything convertible to values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map from `(key, value)` pairs, keeping their order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Keyed lookup: a map entry by key, or a list item by numeric index.
    ///
    /// `Ok(None)` means the structure has no such key.
    pub fn get(&self, key: &str) -> Result<Option<&Value>, CompileError> {
        match self {
            Value::Map(entries) => Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)),
            Value::List(items) => Ok(key.parse::<usize>().ok().and_then(|i| items.get(i))),
            other => Err(CompileError::type_error(format!(
                "cannot look up '{key}' in a {}",
                other.type_name()
            ))),
        }
    }

    /// The entries an `@each` loop iterates over.
    ///
    /// Lists yield their items; maps yield `[key, value]` pairs.
    pub fn entries(&self) -> Result<Vec<Value>, CompileError> {
        match self {
            Value::List(items) => Ok(items.clone()),
            Value::Map(entries) => Ok(entries
                .iter()
                .map(|(k, v)| Value::List(vec![Value::scalar(k.clone()), v.clone()]))
                .collect()),
            other => Err(CompileError::type_error(format!(
                "cannot loop over a {}",
                other.type_name()
            ))),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = ResourceError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value as Yaml;

        Ok(match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Scalar(b.to_string()),
            Yaml::Number(n) => Value::Scalar(n.to_string()),
            Yaml::String(s) => Value::Scalar(s),
            Yaml::Sequence(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| Ok((scalar_key(k)?, Value::try_from(v)?)))
                    .collect::<Result<_, ResourceError>>()?,
            ),
            Yaml::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

fn scalar_key(key: serde_yaml::Value) -> Result<String, ResourceError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(ResourceError::UnsupportedKey),
    }
}

/// Variable bindings visible to a document or loop body.
///
/// Names include the `$` sigil. Child environments copy their parent and add
/// or shadow bindings; nothing is ever mutated in place once shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Look up a variable, failing with a reference error if unbound.
    pub fn require(&self, name: &str) -> Result<&Value, CompileError> {
        self.get(name).ok_or_else(|| CompileError::reference(name))
    }

    /// Bind a variable in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// A child environment: this one plus `bindings`.
    pub fn extend<I>(&self, bindings: I) -> Environment
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut child = self.clone();
        child.bindings.extend(bindings);
        child
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
