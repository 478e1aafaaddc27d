//! Document model assembled from a FOXML file
//!
//! Every node is created during a single streaming pass and is immutable
//! once its element closes. The whole tree is serde-serializable so it can be
//! cached, and carries no parsing machinery.

pub mod content;
pub mod datastream;
pub mod object;
pub mod rels;

pub use content::{Content, ContentDigest, ContentLocation, InlineContent, InlineEncoding, LocationKind};
pub use datastream::{Datastream, DatastreamVersion};
pub use object::{DigitalObject, ObjectProperties, ObjectProperty};
pub use rels::Relation;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StructureError;

/// Attributes of an element, as reported by the parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Fetch an attribute an element cannot do without
    pub fn require(&self, element: &'static str, attribute: &'static str) -> Result<&str, StructureError> {
        self.get(attribute)
            .ok_or(StructureError::MissingAttribute { element, attribute })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for Attributes {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Attributes(pairs.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Attributes {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        let attrs = Attributes::from([("ID", "DC")]);
        assert_eq!(attrs.require("datastream", "ID"), Ok("DC"));
        assert_eq!(
            attrs.require("datastream", "STATE"),
            Err(StructureError::MissingAttribute {
                element: "datastream",
                attribute: "STATE"
            })
        );
    }
}
