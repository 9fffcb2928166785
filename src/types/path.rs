//! Dot-separated insertion paths.

use std::fmt;
use std::str::FromStr;

use crate::HuginnError;

/// Where inside a record the metadata mapping is placed.
///
/// Parsed from a dot string such as `logContent.oracle`. The empty string
/// addresses the record itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertionPath {
    segments: Vec<String>,
}

impl InsertionPath {
    /// The record root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot path. Empty segments (`a..b`, `.a`, `a.`) are rejected.
    pub fn parse(path: &str) -> Result<Self, HuginnError> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(HuginnError::Configuration(format!(
                "invalid insertion path '{path}': empty segment"
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for InsertionPath {
    type Err = HuginnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InsertionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
