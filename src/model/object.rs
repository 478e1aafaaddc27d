//! The digital object root and its property bag

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::datastream::Datastream;
use super::rels::{self, ns, Relation};
use super::Attributes;
use crate::error::{Result, StructureError};

/// Relationship datastream identifier
pub const RELS_EXT: &str = "RELS-EXT";

/// Predicates [`DigitalObject::parents`] follows by default
pub const DEFAULT_PARENT_PREDICATES: &[&str] = &["isMemberOf", "isMemberOfCollection"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub name: String,
    pub value: String,
    /// Written as `extproperty` rather than `property`
    pub extended: bool,
}

/// The `objectProperties` bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProperties {
    properties: HashMap<String, ObjectProperty>,
}

impl ObjectProperties {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.value.as_str())
    }

    pub fn property(&self, name: &str) -> Option<&ObjectProperty> {
        self.properties.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectProperty> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn insert(&mut self, property: ObjectProperty) -> std::result::Result<(), StructureError> {
        if self.properties.contains_key(&property.name) {
            return Err(StructureError::DuplicateProperty { name: property.name });
        }
        self.properties.insert(property.name.clone(), property);
        Ok(())
    }
}

/// A parsed FOXML digital object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalObject {
    pid: String,
    attributes: Attributes,
    properties: Option<ObjectProperties>,
    datastreams: HashMap<String, Datastream>,
    #[serde(skip)]
    relations: OnceLock<Vec<Relation>>,
}

impl DigitalObject {
    pub fn new(pid: String, attributes: Attributes) -> Self {
        DigitalObject {
            pid,
            attributes,
            properties: None,
            datastreams: HashMap::new(),
            relations: OnceLock::new(),
        }
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn properties(&self) -> Option<&ObjectProperties> {
        self.properties.as_ref()
    }

    /// Object property by its full name, e.g.
    /// `info:fedora/fedora-system:def/model#label`
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.as_ref()?.get(name)
    }

    /// Property if present, otherwise the root element attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.property(name).or_else(|| self.attribute(name))
    }

    pub fn label(&self) -> Option<&str> {
        self.property(concat!("info:fedora/fedora-system:def/model#", "label"))
    }

    pub fn state(&self) -> Option<&str> {
        self.property(concat!("info:fedora/fedora-system:def/model#", "state"))
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.property(concat!("info:fedora/fedora-system:def/model#", "ownerId"))
    }

    pub fn created_date(&self) -> Option<&str> {
        self.property(concat!("info:fedora/fedora-system:def/model#", "createdDate"))
    }

    pub fn last_modified_date(&self) -> Option<&str> {
        self.property(concat!("info:fedora/fedora-system:def/view#", "lastModifiedDate"))
    }

    pub fn datastream(&self, id: &str) -> Option<&Datastream> {
        self.datastreams.get(id)
    }

    pub fn datastreams(&self) -> impl Iterator<Item = &Datastream> {
        self.datastreams.values()
    }

    pub fn datastream_count(&self) -> usize {
        self.datastreams.len()
    }

    /// Attach the property bag; an object has at most one
    pub fn set_properties(&mut self, properties: ObjectProperties) -> std::result::Result<(), StructureError> {
        if self.properties.is_some() {
            return Err(StructureError::DuplicateProperties);
        }
        self.properties = Some(properties);
        Ok(())
    }

    pub fn insert_datastream(&mut self, datastream: Datastream) -> std::result::Result<(), StructureError> {
        if self.datastreams.contains_key(datastream.id()) {
            return Err(StructureError::DuplicateDatastream {
                id: datastream.id().to_string(),
            });
        }
        self.datastreams.insert(datastream.id().to_string(), datastream);
        Ok(())
    }

    /// Relations from the latest RELS-EXT version, empty when the object
    /// has none. Parsed once per instance.
    pub fn relations(&self) -> Result<&[Relation]> {
        if let Some(relations) = self.relations.get() {
            return Ok(relations.as_slice());
        }
        let relations = match self.datastream(RELS_EXT).and_then(Datastream::latest) {
            Some(version) => rels::load(version.content())?,
            None => Vec::new(),
        };
        Ok(self.relations.get_or_init(|| relations).as_slice())
    }

    /// Content model identifiers (`fedora-model:hasModel`)
    pub fn models(&self) -> Result<Vec<String>> {
        Ok(self
            .relations()?
            .iter()
            .filter(|r| r.is(ns::FM, "hasModel"))
            .map(|r| r.resource.clone())
            .collect())
    }

    /// Parent identifiers related through any of `predicates` in the
    /// relations-external namespace
    pub fn parents(&self, predicates: &[&str]) -> Result<Vec<String>> {
        Ok(self
            .relations()?
            .iter()
            .filter(|r| predicates.iter().any(|p| r.is(ns::FRE, p)))
            .map(|r| r.resource.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Content, ContentLocation, DatastreamVersion, LocationKind};
    use std::io::Write;

    fn datastream_at(id: &str, uri: &str) -> Datastream {
        let mut ds = Datastream::new(id.to_string(), Attributes::default());
        let version = DatastreamVersion::new(
            format!("{id}.0"),
            Attributes::default(),
            Content::Location(ContentLocation {
                kind: LocationKind::Url,
                reference: uri.to_string(),
                uri: uri.to_string(),
            }),
            None,
        );
        ds.push_version(version).unwrap();
        ds
    }

    #[test]
    fn test_duplicate_datastream_rejected_without_mutation() {
        let mut object = DigitalObject::new("test:1".into(), Attributes::default());
        object.insert_datastream(datastream_at("DC", "http://first")).unwrap();

        let err = object.insert_datastream(datastream_at("DC", "http://second")).unwrap_err();
        assert_eq!(err, StructureError::DuplicateDatastream { id: "DC".into() });
        assert_eq!(object.datastream_count(), 1);
        assert_eq!(
            object.datastream("DC").and_then(Datastream::content_uri).as_deref(),
            Some("http://first")
        );
    }

    #[test]
    fn test_second_property_bag_rejected() {
        let mut object = DigitalObject::new("test:1".into(), Attributes::default());
        let mut first = ObjectProperties::default();
        first
            .insert(ObjectProperty {
                name: "info:fedora/fedora-system:def/model#label".into(),
                value: "First".into(),
                extended: false,
            })
            .unwrap();
        object.set_properties(first).unwrap();

        let err = object.set_properties(ObjectProperties::default()).unwrap_err();
        assert_eq!(err, StructureError::DuplicateProperties);
        assert_eq!(object.label(), Some("First"));
    }

    #[test]
    fn test_get_prefers_property() {
        let mut object = DigitalObject::new("test:1".into(), Attributes::from([("PID", "test:1"), ("VERSION", "1.1")]));
        let mut properties = ObjectProperties::default();
        properties
            .insert(ObjectProperty {
                name: "PID".into(),
                value: "shadowed".into(),
                extended: true,
            })
            .unwrap();
        object.set_properties(properties).unwrap();

        assert_eq!(object.get("PID"), Some("shadowed"));
        assert_eq!(object.get("VERSION"), Some("1.1"));
        assert_eq!(object.get("missing"), None);
    }

    #[test]
    fn test_missing_rels_ext_is_empty() {
        let object = DigitalObject::new("test:1".into(), Attributes::default());
        assert!(object.models().unwrap().is_empty());
        assert!(object.parents(DEFAULT_PARENT_PREDICATES).unwrap().is_empty());
    }

    #[test]
    fn test_models_and_parents_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:fedora="info:fedora/fedora-system:def/relations-external#"
  xmlns:fedora-model="info:fedora/fedora-system:def/model#">
<rdf:Description rdf:about="info:fedora/test:1">
  <fedora-model:hasModel rdf:resource="info:fedora/cmodel:1"/>
  <fedora:isMemberOfCollection rdf:resource="info:fedora/test:root"/>
  <fedora:isPartOf rdf:resource="info:fedora/test:book"/>
</rdf:Description>
</rdf:RDF>"#,
        )
        .unwrap();

        let mut object = DigitalObject::new("test:1".into(), Attributes::default());
        let path = file.path().to_string_lossy().into_owned();
        object.insert_datastream(datastream_at(RELS_EXT, &path)).unwrap();

        assert_eq!(object.models().unwrap(), vec!["info:fedora/cmodel:1"]);
        assert_eq!(
            object.parents(DEFAULT_PARENT_PREDICATES).unwrap(),
            vec!["info:fedora/test:root"]
        );
        assert_eq!(object.parents(&["isPartOf"]).unwrap(), vec!["info:fedora/test:book"]);
    }
}
