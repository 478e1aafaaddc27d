//! Content descriptors of a datastream version

use serde::{Deserialize, Serialize};

use crate::error::StructureError;
use crate::stream::Substream;

/// How a `contentLocation` reference is to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationKind {
    /// External absolute URI, used verbatim
    Url,
    /// Repository identifier, resolved through the datastream adapters
    InternalId,
}

impl LocationKind {
    pub fn from_attribute(kind: &str) -> Result<Self, StructureError> {
        match kind {
            "URL" => Ok(LocationKind::Url),
            "INTERNAL_ID" => Ok(LocationKind::InternalId),
            other => Err(StructureError::UnhandledLocationType {
                kind: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLocation {
    pub kind: LocationKind,
    /// The `REF` attribute as written
    pub reference: String,
    /// Resolved at parse time
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineEncoding {
    /// `xmlContent`: an XML fragment
    Xml,
    /// `binaryContent`: base64 text
    Base64,
}

/// Content embedded in the FOXML file itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineContent {
    pub encoding: InlineEncoding,
    pub substream: Substream,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Location(ContentLocation),
    Inline(InlineContent),
}

impl Content {
    /// Where to read the content from
    ///
    /// Inline content is addressed with the `substream:` URI form.
    pub fn uri(&self) -> String {
        match self {
            Content::Location(location) => location.uri.clone(),
            Content::Inline(inline) => inline.substream.to_string(),
        }
    }

    pub fn substream(&self) -> Option<&Substream> {
        match self {
            Content::Inline(inline) => Some(&inline.substream),
            Content::Location(_) => None,
        }
    }
}

/// `contentDigest` of a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDigest {
    pub algorithm: String,
    pub digest: String,
}
