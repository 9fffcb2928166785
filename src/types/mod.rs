//! Core data model: identifiers, tag sets and insertion paths.

mod ocid;
mod path;
mod tags;

pub use ocid::{Ocid, OcidGrammar};
pub use path::InsertionPath;
pub use tags::{TagCategory, TagSet, Tags};
