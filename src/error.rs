//! Error types for parsing, model assembly and storage resolution.

use std::path::PathBuf;

/// Malformed input reported by the push parser
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct SyntaxError {
    /// 1-based line of the offending construct
    pub line: u64,
    /// 1-based column, in bytes
    pub column: u64,
    pub message: String,
}

/// Well-formed XML that violates the document model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("too many \"objectProperties\" elements")]
    DuplicateProperties,

    #[error("refusing to replace property {name}")]
    DuplicateProperty { name: String },

    #[error("refusing to replace datastream {id}")]
    DuplicateDatastream { id: String },

    #[error("refusing to replace version {version} of datastream {datastream}")]
    DuplicateVersion { datastream: String, version: String },

    #[error("refusing to replace content of datastream version {version}")]
    DuplicateContent { version: String },

    #[error("datastream version {version} has more than one content digest")]
    DuplicateDigest { version: String },

    #[error("datastream version {version} has no content")]
    MissingContent { version: String },

    #[error("more than one digital object in document")]
    DuplicateObject,

    #[error("leaf node {leaf} should not contain additional elements; got a {tag:?} tag")]
    LeafChild { leaf: &'static str, tag: String },

    #[error("unexpected {tag:?} element inside {parent}")]
    UnexpectedElement { parent: &'static str, tag: String },

    #[error("unhandled content location type {kind:?}")]
    UnhandledLocationType { kind: String },

    #[error("{element} is missing required attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

/// The storage adapter chain could not resolve an identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("invalid low-level storage adapter configuration: no valid adapter")]
    NoAdapter,

    #[error("failed to dereference {id:?}")]
    DereferenceFailed { id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(SyntaxError),

    #[error("structural error: {0}")]
    Structure(#[from] StructureError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("parsing {} did not produce a digital object; truncated/bad file?", target.display())]
    NoDocument { target: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error("cannot read content at {uri:?}: {reason}")]
    UnsupportedContent { uri: String, reason: &'static str },
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl Error {
    /// Attach the path of the file an I/O error happened on
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Open {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err: Error = SyntaxError {
            line: 3,
            column: 7,
            message: "mismatched tag".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "syntax error: line 3, column 7: mismatched tag");
    }
}
