//! Tag-dispatch stack automaton
//!
//! Every in-progress element is a [`Frame`]: its handler state, per-tag depth
//! counters for the child tags it recognizes, and a stack of child frames.
//! An event is either claimed by a frame (a recognized child opens or
//! closes) or forwarded to the frame on top of its stack. Closing a child
//! turns it into a finished model node which the parent adopts.
//!
//! Below an open `xmlContent` or `binaryContent` everything is payload: no
//! frame opens a new child, and only tags a frame already has open are
//! counted, so an embedded FOXML document passes through untouched.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

use super::element_map::{self, ElementKind, ElementMap};
use crate::core::TextChunk;
use crate::error::{ResolutionError, Result, StructureError};
use crate::model::{
    Attributes, Content, ContentDigest, ContentLocation, Datastream, DatastreamVersion, DigitalObject,
    InlineContent, InlineEncoding, LocationKind, ObjectProperties, ObjectProperty,
};
use crate::storage::LowLevelAdapter;
use crate::stream::Substream;

/// Per-event view of the parse session
///
/// Handlers never keep it; a fresh one is built for every event.
pub struct Context<'a> {
    pub target: &'a Path,
    /// True byte offset of the current event
    pub offset: u64,
    /// `None` when no valid datastream adapter is configured
    pub datastreams: Option<&'a dyn LowLevelAdapter>,
}

enum Handler {
    Document {
        object: Option<DigitalObject>,
    },
    DigitalObject(DigitalObject),
    ObjectProperties(ObjectProperties),
    Property(ObjectProperty),
    Datastream(Datastream),
    DatastreamVersion {
        id: String,
        attributes: Attributes,
        content: Option<Content>,
        digest: Option<ContentDigest>,
    },
    ContentLocation(Attributes),
    ContentDigest(ContentDigest),
    Inline {
        encoding: InlineEncoding,
        start: u64,
        end: u64,
    },
}

/// A closed element, ready for its parent
enum Finished {
    Object(DigitalObject),
    Properties(ObjectProperties),
    Property(ObjectProperty),
    Datastream(Datastream),
    Version(DatastreamVersion),
    Content(Content),
    Digest(ContentDigest),
}

impl Handler {
    fn name(&self) -> &'static str {
        match self {
            Handler::Document { .. } => "document",
            Handler::DigitalObject(_) => "digitalObject",
            Handler::ObjectProperties(_) => "objectProperties",
            Handler::Property(p) if p.extended => "extproperty",
            Handler::Property(_) => "property",
            Handler::Datastream(_) => "datastream",
            Handler::DatastreamVersion { .. } => "datastreamVersion",
            Handler::ContentLocation(_) => "contentLocation",
            Handler::ContentDigest(_) => "contentDigest",
            Handler::Inline {
                encoding: InlineEncoding::Xml,
                ..
            } => "xmlContent",
            Handler::Inline { .. } => "binaryContent",
        }
    }

    fn map(&self) -> ElementMap {
        match self {
            Handler::Document { .. } => element_map::DOCUMENT,
            Handler::DigitalObject(_) => element_map::DIGITAL_OBJECT,
            Handler::ObjectProperties(_) => element_map::OBJECT_PROPERTIES,
            Handler::Datastream(_) => element_map::DATASTREAM,
            Handler::DatastreamVersion { .. } => element_map::DATASTREAM_VERSION,
            _ => element_map::NONE,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Handler::Property(_) | Handler::ContentLocation(_) | Handler::ContentDigest(_)
        )
    }
}

pub struct Frame {
    handler: Handler,
    depths: HashMap<&'static str, usize>,
    stack: Vec<Frame>,
}

impl Frame {
    /// The document level, above the root element
    pub fn document() -> Self {
        Frame::with(Handler::Document { object: None })
    }

    fn with(handler: Handler) -> Self {
        Frame {
            handler,
            depths: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn open(kind: ElementKind, ctx: &Context<'_>, attributes: Attributes) -> Result<Self> {
        let handler = match kind {
            ElementKind::DigitalObject => {
                let pid = attributes.require("digitalObject", "PID")?.to_string();
                debug!(pid = %pid, "object started");
                Handler::DigitalObject(DigitalObject::new(pid, attributes))
            }
            ElementKind::ObjectProperties => Handler::ObjectProperties(ObjectProperties::default()),
            ElementKind::Property | ElementKind::ExtProperty => {
                let extended = kind == ElementKind::ExtProperty;
                let element = if extended { "extproperty" } else { "property" };
                Handler::Property(ObjectProperty {
                    name: attributes.require(element, "NAME")?.to_string(),
                    value: attributes.get("VALUE").unwrap_or_default().to_string(),
                    extended,
                })
            }
            ElementKind::Datastream => {
                let id = attributes.require("datastream", "ID")?.to_string();
                Handler::Datastream(Datastream::new(id, attributes))
            }
            ElementKind::DatastreamVersion => Handler::DatastreamVersion {
                id: attributes.require("datastreamVersion", "ID")?.to_string(),
                attributes,
                content: None,
                digest: None,
            },
            ElementKind::ContentLocation => Handler::ContentLocation(attributes),
            ElementKind::ContentDigest => Handler::ContentDigest(ContentDigest {
                algorithm: attributes.require("contentDigest", "TYPE")?.to_string(),
                digest: attributes.require("contentDigest", "DIGEST")?.to_string(),
            }),
            ElementKind::XmlContent | ElementKind::BinaryContent => Handler::Inline {
                encoding: if kind == ElementKind::XmlContent {
                    InlineEncoding::Xml
                } else {
                    InlineEncoding::Base64
                },
                start: ctx.offset,
                end: ctx.offset,
            },
        };
        Ok(Frame::with(handler))
    }

    pub fn tag_open(&mut self, ctx: &Context<'_>, tag: &str, attributes: Attributes) -> Result<()> {
        if self.handler.is_leaf() {
            return Err(self.leaf_child(tag));
        }
        if let Handler::Inline { end, .. } = &mut self.handler {
            *end = ctx.offset;
            return Ok(());
        }

        if let Some((key, kind)) = element_map::lookup(self.handler.map(), tag) {
            if !self.in_inline() || self.depths.contains_key(key) {
                let depth = self.depths.entry(key).or_insert(0);
                *depth += 1;
                if *depth == 1 {
                    let child = Frame::open(kind, ctx, attributes)?;
                    self.stack.push(child);
                    return Ok(());
                }
            }
        }

        match self.stack.last_mut() {
            Some(child) => child.tag_open(ctx, tag, attributes),
            None => self.unclaimed(tag),
        }
    }

    pub fn tag_close(&mut self, ctx: &Context<'_>, tag: &str) -> Result<()> {
        if self.handler.is_leaf() {
            return Err(self.leaf_child(tag));
        }
        if let Handler::Inline { end, .. } = &mut self.handler {
            *end = ctx.offset;
            return Ok(());
        }

        if let Some((key, _)) = element_map::lookup(self.handler.map(), tag) {
            if let Some(depth) = self.depths.get_mut(key) {
                *depth -= 1;
                if *depth == 0 {
                    self.depths.remove(key);
                    if let Some(child) = self.stack.pop() {
                        let finished = child.close(ctx)?;
                        self.adopt(finished)?;
                    }
                    return Ok(());
                }
            }
        }

        match self.stack.last_mut() {
            Some(child) => child.tag_close(ctx, tag),
            None => self.unclaimed(tag),
        }
    }

    pub fn characters(&mut self, ctx: &Context<'_>, text: &TextChunk<'_>) {
        if let Handler::Inline { end, .. } = &mut self.handler {
            let len = text.source_len() as u64;
            if ctx.offset == *end {
                // The reported index does not move over character data
                *end += len;
            } else {
                *end = ctx.offset + len;
            }
            return;
        }
        if let Some(child) = self.stack.last_mut() {
            child.characters(ctx, text);
        }
    }

    /// A comment or processing instruction ended at `ctx.offset`
    pub fn markup(&mut self, ctx: &Context<'_>) {
        if let Handler::Inline { end, .. } = &mut self.handler {
            *end = ctx.offset;
            return;
        }
        if let Some(child) = self.stack.last_mut() {
            child.markup(ctx);
        }
    }

    /// Whether the innermost open element below this frame is inline content
    fn in_inline(&self) -> bool {
        match self.stack.last() {
            Some(child) => matches!(child.handler, Handler::Inline { .. }) || child.in_inline(),
            None => false,
        }
    }

    /// Take the root object out of a finished document frame
    pub fn into_object(self) -> Option<DigitalObject> {
        match self.handler {
            Handler::Document { object } => object,
            _ => None,
        }
    }

    fn leaf_child(&self, tag: &str) -> crate::error::Error {
        StructureError::LeafChild {
            leaf: self.handler.name(),
            tag: tag.to_string(),
        }
        .into()
    }

    /// An event nothing claimed and no child can take
    fn unclaimed(&self, tag: &str) -> Result<()> {
        match self.handler {
            Handler::Document { .. } => {
                trace!(tag, "ignoring element outside of the digital object");
                Ok(())
            }
            _ => Err(StructureError::UnexpectedElement {
                parent: self.handler.name(),
                tag: tag.to_string(),
            }
            .into()),
        }
    }

    fn close(self, ctx: &Context<'_>) -> Result<Finished> {
        let finished = match self.handler {
            Handler::DigitalObject(object) => {
                debug!(pid = object.pid(), datastreams = object.datastream_count(), "object finished");
                Finished::Object(object)
            }
            Handler::ObjectProperties(properties) => Finished::Properties(properties),
            Handler::Property(property) => Finished::Property(property),
            Handler::Datastream(datastream) => {
                trace!(datastream = datastream.id(), versions = datastream.versions().len(), "datastream finished");
                Finished::Datastream(datastream)
            }
            Handler::DatastreamVersion {
                id,
                attributes,
                content,
                digest,
            } => {
                let content = content.ok_or_else(|| StructureError::MissingContent { version: id.clone() })?;
                Finished::Version(DatastreamVersion::new(id, attributes, content, digest))
            }
            Handler::ContentLocation(attributes) => {
                let kind = LocationKind::from_attribute(attributes.require("contentLocation", "TYPE")?)?;
                let reference = attributes.require("contentLocation", "REF")?.to_string();
                // Resolved now: the adapters are out of reach once parsing ends
                let uri = match kind {
                    LocationKind::Url => reference.clone(),
                    LocationKind::InternalId => ctx
                        .datastreams
                        .ok_or(ResolutionError::NoAdapter)?
                        .dereference(&reference)?,
                };
                Finished::Content(Content::Location(ContentLocation { kind, reference, uri }))
            }
            Handler::ContentDigest(digest) => Finished::Digest(digest),
            Handler::Inline { encoding, start, end } => {
                let substream = Substream::new(ctx.target, start, end.saturating_sub(start));
                Finished::Content(Content::Inline(InlineContent { encoding, substream }))
            }
            Handler::Document { .. } => {
                return Err(StructureError::UnexpectedElement {
                    parent: "document",
                    tag: "document".to_string(),
                }
                .into())
            }
        };
        Ok(finished)
    }

    fn adopt(&mut self, finished: Finished) -> Result<()> {
        match (&mut self.handler, finished) {
            (Handler::Document { object }, Finished::Object(new)) => {
                if object.is_some() {
                    return Err(StructureError::DuplicateObject.into());
                }
                *object = Some(new);
            }
            (Handler::DigitalObject(object), Finished::Properties(properties)) => object.set_properties(properties)?,
            (Handler::DigitalObject(object), Finished::Datastream(datastream)) => {
                object.insert_datastream(datastream)?
            }
            (Handler::ObjectProperties(properties), Finished::Property(property)) => properties.insert(property)?,
            (Handler::Datastream(datastream), Finished::Version(version)) => datastream.push_version(version)?,
            (Handler::DatastreamVersion { id, content, .. }, Finished::Content(new)) => {
                if content.is_some() {
                    return Err(StructureError::DuplicateContent { version: id.clone() }.into());
                }
                *content = Some(new);
            }
            (Handler::DatastreamVersion { id, digest, .. }, Finished::Digest(new)) => {
                if digest.is_some() {
                    return Err(StructureError::DuplicateDigest { version: id.clone() }.into());
                }
                *digest = Some(new);
            }
            // Element maps only ever produce the pairs above
            _ => {}
        }
        Ok(())
    }
}
