//! Relationship (RELS-EXT) extraction
//!
//! Reads the RDF/XML relationship datastream of an object and collects the
//! `rdf:resource` of every `/rdf:RDF/rdf:Description/*` child.

use std::fs;

use super::content::{Content, InlineEncoding};
use crate::core::{EventSink, PushParser, TextChunk};
use crate::error::{Error, Result};
use crate::stream::Substream;

/// Namespaces relationship queries are written against
pub mod ns {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const FRE: &str = "info:fedora/fedora-system:def/relations-external#";
    pub const FM: &str = "info:fedora/fedora-system:def/model#";
}

macro_rules! rdf {
    ($local:literal) => {
        concat!("http://www.w3.org/1999/02/22-rdf-syntax-ns#", ":", $local)
    };
}

/// `predicate` is the expanded `namespace-uri:local-name` of the element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub predicate: String,
    pub resource: String,
}

impl Relation {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.predicate
            .strip_prefix(namespace)
            .and_then(|rest| rest.strip_prefix(crate::core::namespace::SEPARATOR))
            == Some(local)
    }
}

#[derive(Default)]
struct Collector {
    /// Whether each open element lies on `/rdf:RDF/rdf:Description`
    path: Vec<bool>,
    relations: Vec<Relation>,
}

impl EventSink for Collector {
    fn start_element(&mut self, _index: i32, name: &str, attributes: Vec<(String, String)>) -> Result<()> {
        let on_path = match self.path.as_slice() {
            [] => name == rdf!("RDF"),
            [root] => *root && name == rdf!("Description"),
            [_, true] => {
                let resource = attributes
                    .into_iter()
                    .find_map(|(attr, value)| (attr == rdf!("resource")).then_some(value));
                if let Some(resource) = resource {
                    self.relations.push(Relation {
                        predicate: name.to_string(),
                        resource,
                    });
                }
                false
            }
            _ => false,
        };
        self.path.push(on_path);
        Ok(())
    }

    fn end_element(&mut self, _index: i32, _name: &str) -> Result<()> {
        self.path.pop();
        Ok(())
    }

    fn characters(&mut self, _index: i32, _text: &TextChunk<'_>) -> Result<()> {
        Ok(())
    }
}

/// Parse an RDF/XML document into its relations
pub fn parse_relations(data: &[u8]) -> Result<Vec<Relation>> {
    let mut parser = PushParser::new(true);
    let mut collector = Collector::default();
    parser.feed(data, true, &mut collector)?;
    Ok(collector.relations)
}

/// Read and parse the relations stored in `content`
pub(crate) fn load(content: &Content) -> Result<Vec<Relation>> {
    let data = match content {
        Content::Inline(inline) => match inline.encoding {
            InlineEncoding::Xml => read_substream(&inline.substream)?,
            InlineEncoding::Base64 => {
                return Err(Error::UnsupportedContent {
                    uri: inline.substream.to_string(),
                    reason: "base64-encoded relationship datastream",
                })
            }
        },
        Content::Location(location) => read_uri(&location.uri)?,
    };
    parse_relations(&data)
}

fn read_substream(substream: &Substream) -> Result<Vec<u8>> {
    substream
        .read_to_vec()
        .map_err(|e| Error::open(&substream.path, e))
}

fn read_uri(uri: &str) -> Result<Vec<u8>> {
    if let Some(substream) = Substream::parse(uri) {
        return read_substream(&substream);
    }
    let path = match uri.strip_prefix("file://") {
        Some(path) => path,
        None if uri.contains("://") => {
            return Err(Error::UnsupportedContent {
                uri: uri.to_string(),
                reason: "only local content can be read",
            })
        }
        None => uri,
    };
    fs::read(path).map_err(|e| Error::open(path, e))
}
