//! Tag filtering by category.

use std::collections::BTreeSet;

use crate::types::{TagCategory, TagSet};

/// Shapes raw tag sets for output.
///
/// Keeps only the selected categories. Unless `include_empty` is set, a
/// category with no tags is dropped rather than emitted as `{}`; a resource
/// left with no categories aggregates to an empty tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    selected: BTreeSet<TagCategory>,
    include_empty: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            selected: TagCategory::ALL.into_iter().collect(),
            include_empty: false,
        }
    }
}

impl Aggregator {
    /// All categories, empty categories omitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select which categories survive aggregation.
    pub fn categories(mut self, categories: impl IntoIterator<Item = TagCategory>) -> Self {
        self.selected = categories.into_iter().collect();
        self
    }

    /// Emit selected categories even when they hold no tags.
    pub fn include_empty(mut self, include: bool) -> Self {
        self.include_empty = include;
        self
    }

    pub fn selected(&self) -> impl Iterator<Item = TagCategory> + '_ {
        self.selected.iter().copied()
    }

    /// Filter `raw` down to the configured shape.
    pub fn aggregate(&self, raw: &TagSet) -> TagSet {
        let mut out = TagSet::new();
        for category in &self.selected {
            let tags = raw.get(*category).cloned().unwrap_or_default();
            if !tags.is_empty() || self.include_empty {
                out.set(*category, Some(tags));
            }
        }
        out
    }
}
