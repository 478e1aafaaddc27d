//! Storage adapters
//!
//! Adapters map repository identifiers onto addressable locations. They are
//! organized into priority-ordered [`AdapterChain`]s: one over datastream
//! storage, used to resolve `INTERNAL_ID` content locations, and one over
//! object storage, used to enumerate the objects to migrate.

pub mod archival;
pub mod chain;
pub mod directory;

pub use archival::ArchivalObjectAdapter;
pub use chain::{AdapterChain, AdapterChainBuilder};
pub use directory::DirectoryDatastreamAdapter;

use std::path::PathBuf;
use std::time::SystemTime;

use crate::error::{ResolutionError, Result};

/// Resolves identifiers to URIs or paths
pub trait LowLevelAdapter: Send + Sync {
    /// Resolve `id`; `Err(DereferenceFailed)` lets the chain try the next
    /// adapter
    fn dereference(&self, id: &str) -> std::result::Result<String, ResolutionError>;

    /// Whether the adapter is usable in the current environment
    fn valid(&self) -> bool;
}

/// The shape of entries an [`ObjectAdapter`] enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorKind {
    /// Bare PIDs, resolved through `dereference`
    Pid,
    /// Paths that can be parsed directly
    Path,
    /// Paths with file metadata
    FileEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEntry {
    Pid(String),
    Path(PathBuf),
    File(FileEntry),
}

/// An adapter over object storage that can also enumerate its contents
pub trait ObjectAdapter: LowLevelAdapter {
    fn iter(&self) -> Result<Box<dyn Iterator<Item = Result<ObjectEntry>> + '_>>;

    fn iterator_kind(&self) -> IteratorKind;
}

/// Chain over datastream storage
pub type DatastreamAdapters = AdapterChain<dyn LowLevelAdapter>;

/// Chain over object storage
pub type ObjectAdapters = AdapterChain<dyn ObjectAdapter>;

/// An adapter that resolves nothing, for parsers that never meet
/// `INTERNAL_ID` locations
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStorage;

impl LowLevelAdapter for NoStorage {
    fn dereference(&self, _id: &str) -> std::result::Result<String, ResolutionError> {
        Err(ResolutionError::NoAdapter)
    }

    fn valid(&self) -> bool {
        false
    }
}
