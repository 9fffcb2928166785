//! Tag sets and tag categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::HuginnError;

/// Tags of one category: tag name (or namespace) → value.
///
/// Defined and system tags carry an extra namespace level, which is kept
/// as a nested object value.
pub type Tags = Map<String, Value>;

/// The three kinds of tags a resource can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Freeform,
    Defined,
    System,
}

impl TagCategory {
    /// All categories, in output order.
    pub const ALL: [TagCategory; 3] = [Self::Freeform, Self::Defined, Self::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freeform => "freeform",
            Self::Defined => "defined",
            Self::System => "system",
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagCategory {
    type Err = HuginnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freeform" => Ok(Self::Freeform),
            "defined" => Ok(Self::Defined),
            "system" => Ok(Self::System),
            other => Err(HuginnError::Configuration(format!(
                "unknown tag category '{other}' (expected freeform, defined or system)"
            ))),
        }
    }
}

/// Tag metadata for one resource.
///
/// A missing category means the resource has no tags of that kind.
/// Serializes as `{"freeform": {..}, "defined": {..}, "system": {..}}`
/// with absent categories omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<Tags>,
}

impl TagSet {
    /// An empty tag set (no categories).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tags for a category.
    pub fn with(mut self, category: TagCategory, tags: Tags) -> Self {
        self.set(category, Some(tags));
        self
    }

    /// Tags of a category, if present.
    pub fn get(&self, category: TagCategory) -> Option<&Tags> {
        match category {
            TagCategory::Freeform => self.freeform.as_ref(),
            TagCategory::Defined => self.defined.as_ref(),
            TagCategory::System => self.system.as_ref(),
        }
    }

    /// Replace (or clear, with `None`) the tags of a category.
    pub fn set(&mut self, category: TagCategory, tags: Option<Tags>) {
        let slot = match category {
            TagCategory::Freeform => &mut self.freeform,
            TagCategory::Defined => &mut self.defined,
            TagCategory::System => &mut self.system,
        };
        *slot = tags;
    }

    /// Whether no category is present.
    pub fn is_empty(&self) -> bool {
        TagCategory::ALL.iter().all(|c| self.get(*c).is_none())
    }

    /// Render as a JSON object for injection.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for category in TagCategory::ALL {
            if let Some(tags) = self.get(category) {
                map.insert(category.as_str().to_string(), Value::Object(tags.clone()));
            }
        }
        Value::Object(map)
    }
}
