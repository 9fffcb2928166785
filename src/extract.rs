//! OCID discovery in arbitrary JSON trees.
//!
//! [`Extractor`] walks a payload depth-first and collects every string that
//! passes the [`OcidGrammar`], in first-encounter order and without
//! duplicates.
//!
//! # Key filter
//!
//! With a key filter configured, a string only counts when the key that
//! directly holds it is in the filter. Strings inside an array inherit the
//! key that holds the array. Containers are always descended into, whatever
//! their key, so `{"data": {"resourceId": "ocid1..."}}` matches a
//! `resourceId` filter.
//!
//! # Depth limit
//!
//! Containers deeper than [`Extractor::max_depth`] are not descended into.
//! Hitting the limit is not an error; identifiers found above it are still
//! returned.
//!
//! # Exclusion
//!
//! [`Extractor::extract_excluding`] skips the value at one object location.
//! The enricher uses it to ignore its own previous output, so enriching an
//! already-enriched record yields the same metadata again.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{InsertionPath, Ocid, OcidGrammar};

/// Default nesting limit for traversal.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Collects candidate identifiers from a JSON value.
///
/// ```rust
/// # use huginn::Extractor;
/// # use serde_json::json;
/// let extractor = Extractor::new().key_filter(["resourceId"]);
/// let found = extractor.extract(&json!({
///     "otherId": "ocid1.instance.oc1.phx.aaaa",
///     "resourceId": "ocid1.bucket.oc1.phx.bbbb",
/// }));
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].as_str(), "ocid1.bucket.oc1.phx.bbbb");
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    key_filter: Option<HashSet<String>>,
    max_depth: usize,
    grammar: OcidGrammar,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            key_filter: None,
            max_depth: DEFAULT_MAX_DEPTH,
            grammar: OcidGrammar::default(),
        }
    }
}

impl Extractor {
    /// Extractor with no key filter, permissive grammar and the default depth.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict discovery to strings held directly by one of `keys`.
    ///
    /// An empty set disables filtering.
    pub fn key_filter<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: HashSet<String> = keys.into_iter().map(Into::into).collect();
        self.key_filter = (!keys.is_empty()).then_some(keys);
        self
    }

    /// Set the maximum container nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the identifier grammar.
    pub fn grammar(mut self, grammar: OcidGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Currently active key filter, if any.
    pub fn filter(&self) -> Option<&HashSet<String>> {
        self.key_filter.as_ref()
    }

    /// Distinct identifiers in `root`, in first-encounter order.
    pub fn extract(&self, root: &Value) -> Vec<Ocid> {
        self.walk(root, None)
    }

    /// Like [`extract`](Self::extract), ignoring the value stored under
    /// `key` in the object at `path`.
    pub fn extract_excluding(&self, root: &Value, path: &InsertionPath, key: &str) -> Vec<Ocid> {
        self.walk(
            root,
            Some(Exclusion {
                path: path.segments(),
                key,
            }),
        )
    }

    fn walk(&self, root: &Value, exclude: Option<Exclusion<'_>>) -> Vec<Ocid> {
        let mut walk = Walk {
            extractor: self,
            seen: HashSet::new(),
            found: Vec::new(),
        };
        walk.visit(root, None, 0, exclude);
        walk.found
    }

    fn key_allowed(&self, key: Option<&str>) -> bool {
        match (&self.key_filter, key) {
            (None, _) => true,
            (Some(filter), Some(key)) => filter.contains(key),
            (Some(_), None) => false,
        }
    }
}

/// Remaining route to the excluded value.
#[derive(Clone, Copy)]
struct Exclusion<'a> {
    path: &'a [String],
    key: &'a str,
}

enum Step<'a> {
    /// The member is the excluded value.
    Skip,
    Visit(Option<Exclusion<'a>>),
}

impl<'a> Exclusion<'a> {
    fn descend(self, member: &str) -> Step<'a> {
        match self.path.split_first() {
            None if member == self.key => Step::Skip,
            None => Step::Visit(None),
            Some((head, rest)) if head == member => Step::Visit(Some(Exclusion {
                path: rest,
                key: self.key,
            })),
            Some(_) => Step::Visit(None),
        }
    }
}

struct Walk<'a> {
    extractor: &'a Extractor,
    seen: HashSet<String>,
    found: Vec<Ocid>,
}

impl Walk<'_> {
    fn visit(
        &mut self,
        value: &Value,
        key: Option<&str>,
        depth: usize,
        exclude: Option<Exclusion<'_>>,
    ) {
        match value {
            Value::Object(map) => {
                if depth >= self.extractor.max_depth {
                    return;
                }
                for (k, v) in map {
                    let child_exclude = match exclude.map(|e| e.descend(k)) {
                        Some(Step::Skip) => continue,
                        Some(Step::Visit(next)) => next,
                        None => None,
                    };
                    self.visit(v, Some(k), depth + 1, child_exclude);
                }
            }
            Value::Array(items) => {
                if depth >= self.extractor.max_depth {
                    return;
                }
                for item in items {
                    self.visit(item, key, depth + 1, None);
                }
            }
            Value::String(s) => {
                if !self.extractor.key_allowed(key) || self.seen.contains(s) {
                    return;
                }
                if let Some(ocid) = Ocid::parse(s, self.extractor.grammar) {
                    self.seen.insert(s.clone());
                    self.found.push(ocid);
                }
            }
            Value::Number(_) | Value::Bool(_) | Value::Null => {}
        }
    }
}
