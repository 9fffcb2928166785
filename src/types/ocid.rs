//! Oracle Cloud Identifiers.
//!
//! An OCID has the shape
//! `ocid1.<resource type>.<realm>.[region][.future use].<unique id>`.
//! Identifiers are opaque once validated; the grammar only decides which
//! strings found in a payload are worth looking up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::HuginnError;

const PREFIX: &str = "ocid1";

/// Minimum segment count: prefix, type, realm, region, unique id.
const MIN_SEGMENTS: usize = 5;

/// How strictly candidate strings are checked against the OCID grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcidGrammar {
    /// Any dot-segmented `ocid1.` string with the five required segments.
    #[default]
    Permissive,
    /// Known realm and region shapes only, at most one future-use segment.
    Strict,
}

impl OcidGrammar {
    /// Check whether `candidate` is a well-formed identifier under this grammar.
    pub fn matches(self, candidate: &str) -> bool {
        let segments: Vec<&str> = candidate.split('.').collect();
        if segments.len() < MIN_SEGMENTS || segments[0] != PREFIX {
            return false;
        }
        if !segments.iter().all(|s| s.chars().all(is_segment_char)) {
            return false;
        }

        let resource_type = segments[1];
        let realm = segments[2];
        let region = segments[3];
        let unique = segments[segments.len() - 1];
        if resource_type.is_empty() || realm.is_empty() || unique.is_empty() {
            return false;
        }

        match self {
            Self::Permissive => true,
            Self::Strict => {
                segments.len() <= MIN_SEGMENTS + 1
                    && resource_type.chars().all(is_lower_alnum)
                    && is_realm(realm)
                    && region.chars().all(|c| is_lower_alnum(c) || c == '-')
                    && segments[4..segments.len() - 1]
                        .iter()
                        .all(|s| s.chars().all(is_lower_alnum))
                    && unique.chars().all(is_lower_alnum)
            }
        }
    }
}

impl FromStr for OcidGrammar {
    type Err = HuginnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(HuginnError::Configuration(format!(
                "unknown OCID grammar '{other}' (expected 'permissive' or 'strict')"
            ))),
        }
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_lower_alnum(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_realm(s: &str) -> bool {
    s.strip_prefix("oc")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// A validated Oracle Cloud Identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ocid(String);

impl Ocid {
    /// Validate `candidate` under `grammar`.
    pub fn parse(candidate: &str, grammar: OcidGrammar) -> Option<Self> {
        grammar
            .matches(candidate)
            .then(|| Self(candidate.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource type segment (e.g. `instance`, `tenancy`).
    pub fn resource_type(&self) -> &str {
        self.0.split('.').nth(1).unwrap_or_default()
    }

    /// Consume into the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for Ocid {
    type Err = HuginnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, OcidGrammar::Permissive)
            .ok_or_else(|| HuginnError::InvalidInput(format!("not an OCID: '{s}'")))
    }
}

impl fmt::Display for Ocid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Ocid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
