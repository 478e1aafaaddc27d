//! Datastreams and their versions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::content::{Content, ContentDigest};
use super::Attributes;
use crate::error::StructureError;

/// One `datastreamVersion` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastreamVersion {
    id: String,
    attributes: Attributes,
    content: Content,
    digest: Option<ContentDigest>,
}

impl DatastreamVersion {
    pub fn new(id: String, attributes: Attributes, content: Content, digest: Option<ContentDigest>) -> Self {
        DatastreamVersion {
            id,
            attributes,
            content,
            digest,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn label(&self) -> Option<&str> {
        self.attribute("LABEL")
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.attribute("MIMETYPE")
    }

    pub fn created(&self) -> Option<&str> {
        self.attribute("CREATED")
    }

    pub fn format_uri(&self) -> Option<&str> {
        self.attribute("FORMAT_URI")
    }

    /// Declared size in bytes, when present and numeric
    pub fn size(&self) -> Option<u64> {
        self.attribute("SIZE")?.parse().ok()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_uri(&self) -> String {
        self.content.uri()
    }

    pub fn digest(&self) -> Option<&ContentDigest> {
        self.digest.as_ref()
    }
}

/// One `datastream` element: its attributes and versions in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datastream {
    id: String,
    attributes: Attributes,
    versions: Vec<DatastreamVersion>,
    index: HashMap<String, usize>,
}

impl Datastream {
    pub fn new(id: String, attributes: Attributes) -> Self {
        Datastream {
            id,
            attributes,
            versions: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn state(&self) -> Option<&str> {
        self.attribute("STATE")
    }

    pub fn control_group(&self) -> Option<&str> {
        self.attribute("CONTROL_GROUP")
    }

    /// The last version in document order
    pub fn latest(&self) -> Option<&DatastreamVersion> {
        self.versions.last()
    }

    pub fn version(&self, id: &str) -> Option<&DatastreamVersion> {
        self.index.get(id).and_then(|&i| self.versions.get(i))
    }

    pub fn versions(&self) -> &[DatastreamVersion] {
        &self.versions
    }

    /// Content URI of the latest version
    pub fn content_uri(&self) -> Option<String> {
        self.latest().map(DatastreamVersion::content_uri)
    }

    /// Append a version; a version ID may only be written once
    pub fn push_version(&mut self, version: DatastreamVersion) -> Result<(), StructureError> {
        if self.index.contains_key(version.id()) {
            return Err(StructureError::DuplicateVersion {
                datastream: self.id.clone(),
                version: version.id,
            });
        }
        self.index.insert(version.id.clone(), self.versions.len());
        self.versions.push(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::{ContentLocation, LocationKind};

    fn version(id: &str, uri: &str) -> DatastreamVersion {
        DatastreamVersion::new(
            id.to_string(),
            Attributes::from([("ID", id), ("SIZE", "42")]),
            Content::Location(ContentLocation {
                kind: LocationKind::Url,
                reference: uri.to_string(),
                uri: uri.to_string(),
            }),
            None,
        )
    }

    #[test]
    fn test_latest_is_last_pushed() {
        let mut ds = Datastream::new("OBJ".into(), Attributes::default());
        ds.push_version(version("OBJ.0", "http://a")).unwrap();
        ds.push_version(version("OBJ.1", "http://b")).unwrap();

        assert_eq!(ds.latest().map(DatastreamVersion::id), Some("OBJ.1"));
        assert_eq!(ds.version("OBJ.0").map(DatastreamVersion::content_uri).as_deref(), Some("http://a"));
        assert_eq!(ds.content_uri().as_deref(), Some("http://b"));
        assert_eq!(ds.versions()[0].size(), Some(42));
    }

    #[test]
    fn test_duplicate_version_rejected_without_mutation() {
        let mut ds = Datastream::new("OBJ".into(), Attributes::default());
        ds.push_version(version("OBJ.0", "http://a")).unwrap();

        let err = ds.push_version(version("OBJ.0", "http://other")).unwrap_err();
        assert_eq!(
            err,
            StructureError::DuplicateVersion {
                datastream: "OBJ".into(),
                version: "OBJ.0".into()
            }
        );
        assert_eq!(ds.versions().len(), 1);
        assert_eq!(ds.content_uri().as_deref(), Some("http://a"));
    }

    #[test]
    fn test_stale_index_entry_is_absent() {
        // A deserialized entry can carry an index that outruns its versions
        let mut ds = Datastream::new("OBJ".into(), Attributes::default());
        ds.push_version(version("OBJ.0", "http://a")).unwrap();
        ds.index.insert("OBJ.7".into(), 7);

        assert!(ds.version("OBJ.7").is_none());
        assert_eq!(ds.version("OBJ.0").map(DatastreamVersion::id), Some("OBJ.0"));
    }
}
