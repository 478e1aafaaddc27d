//! Element type maps
//!
//! Each handler kind recognizes a fixed set of child tags. Keys are stored in
//! canonical form, the expanded `namespace-uri:local-name` of the FOXML
//! namespace, and incoming names are canonicalized the same way so lookups
//! work whether or not the parser expanded them.

use std::borrow::Cow;

pub const FOXML_NS: &str = "info:fedora/fedora-system:def/foxml#";

/// Conventional prefix rewritten to [`FOXML_NS`]
const FOXML_PREFIX: &str = "foxml:";

macro_rules! foxml {
    ($local:literal) => {
        concat!("info:fedora/fedora-system:def/foxml#", ":", $local)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    DigitalObject,
    ObjectProperties,
    Property,
    ExtProperty,
    Datastream,
    DatastreamVersion,
    ContentLocation,
    ContentDigest,
    XmlContent,
    BinaryContent,
}

pub type ElementMap = &'static [(&'static str, ElementKind)];

pub const DOCUMENT: ElementMap = &[(foxml!("digitalObject"), ElementKind::DigitalObject)];

pub const DIGITAL_OBJECT: ElementMap = &[
    (foxml!("objectProperties"), ElementKind::ObjectProperties),
    (foxml!("datastream"), ElementKind::Datastream),
];

pub const OBJECT_PROPERTIES: ElementMap = &[
    (foxml!("property"), ElementKind::Property),
    (foxml!("extproperty"), ElementKind::ExtProperty),
];

pub const DATASTREAM: ElementMap = &[(foxml!("datastreamVersion"), ElementKind::DatastreamVersion)];

pub const DATASTREAM_VERSION: ElementMap = &[
    (foxml!("contentLocation"), ElementKind::ContentLocation),
    (foxml!("xmlContent"), ElementKind::XmlContent),
    (foxml!("binaryContent"), ElementKind::BinaryContent),
    (foxml!("contentDigest"), ElementKind::ContentDigest),
];

/// Leaf and inline handlers recognize nothing
pub const NONE: ElementMap = &[];

/// Find `tag` (canonical) in `map`, returning the stored key
#[inline]
pub fn lookup(map: ElementMap, tag: &str) -> Option<(&'static str, ElementKind)> {
    map.iter().find(|(key, _)| *key == tag).copied()
}

/// Rewrite a `foxml:`-prefixed name into its expanded form
pub fn canonicalize(name: &str) -> Cow<'_, str> {
    match name.strip_prefix(FOXML_PREFIX) {
        Some(local) => Cow::Owned(format!("{FOXML_NS}:{local}")),
        None => Cow::Borrowed(name),
    }
}
