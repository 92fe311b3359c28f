//! Resource access: reading imported documents and `@each` data files.
//!
//! The interpreter never touches the filesystem directly. It asks a
//! [`Resources`] implementation for text or structured data by path, which
//! keeps compilation testable against in-memory fixtures.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ResourceError;
use crate::interp::value::Value;

/// Source of imported documents and structured data.
pub trait Resources {
    /// Read a document as text.
    fn read_text(&self, path: &Path) -> Result<String, ResourceError>;

    /// Read a structured data file (YAML; JSON is a subset).
    fn read_structured(&self, path: &Path) -> Result<Value, ResourceError>;
}

/// Parse structured data text into a [`Value`].
pub fn parse_structured(text: &str) -> Result<Value, ResourceError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    Value::try_from(yaml)
}

// ---------------------------------------------------------------------------
// FileSystem
// ---------------------------------------------------------------------------

/// Reads resources from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl Resources for FileSystem {
    fn read_text(&self, path: &Path) -> Result<String, ResourceError> {
        Ok(fs::read_to_string(path)?)
    }

    fn read_structured(&self, path: &Path) -> Result<Value, ResourceError> {
        parse_structured(&fs::read_to_string(path)?)
    }
}

// ---------------------------------------------------------------------------
// MemoryResources
// ---------------------------------------------------------------------------

/// In-memory resources keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    files: HashMap<PathBuf, String>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder).
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files
            .insert(normalize(path.as_ref()), contents.into());
    }

    fn lookup(&self, path: &Path) -> Result<&str, ResourceError> {
        self.files
            .get(&normalize(path))
            .map(String::as_str)
            .ok_or(ResourceError::NotFound)
    }
}

impl Resources for MemoryResources {
    fn read_text(&self, path: &Path) -> Result<String, ResourceError> {
        self.lookup(path).map(str::to_string)
    }

    fn read_structured(&self, path: &Path) -> Result<Value, ResourceError> {
        parse_structured(self.lookup(path)?)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Resolve `relative` against the directory containing `document`.
pub fn resolve_relative(document: &Path, relative: &str) -> PathBuf {
    let base = document.parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(relative))
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}
