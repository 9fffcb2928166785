//! In-memory fetcher backed by a fixed map.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::TagFetcher;
use crate::error::FetchError;
use crate::types::{Ocid, TagSet};
use crate::{HuginnError, Result};

/// Serves tags from a fixed `OCID → TagSet` map.
///
/// Unknown identifiers fail with [`FetchError::NotFound`]. Used for
/// offline runs (`huginn --tags-file`) and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    tags: HashMap<Ocid, TagSet>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the tags for `id`.
    pub fn with(mut self, id: Ocid, tags: TagSet) -> Self {
        self.tags.insert(id, tags);
        self
    }

    /// Parse a JSON object of `{"<ocid>": {"freeform": {..}, ..}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, TagSet> = serde_json::from_str(json)?;
        let mut tags = HashMap::with_capacity(raw.len());
        for (id, set) in raw {
            tags.insert(id.parse::<Ocid>()?, set);
        }
        Ok(Self { tags })
    }

    /// Load a JSON tags file (see [`from_json`](Self::from_json)).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("failed to read tags file {path:?}: {e}"))
        })?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[async_trait]
impl TagFetcher for StaticFetcher {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, id: &Ocid) -> std::result::Result<TagSet, FetchError> {
        self.tags
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}
