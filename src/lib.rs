//! foxml - Streaming FOXML parser
//!
//! Reads Fedora Commons FOXML export files into [`DigitalObject`]s: object
//! properties, datastreams and their ordered versions, and where each
//! version's content lives. Inline content is never decoded; it is recorded
//! as a [`Substream`] byte range of the source file so callers can copy it
//! out later without holding the document in memory.
//!
//! Layers:
//! - [`core`]: incremental push parser with wrapping byte indices
//! - [`stream`]: chunked input, offset reconciliation, substreams
//! - [`parser`]: tag-dispatch automaton and the [`FoxmlParser`] orchestrator
//! - [`model`]: the assembled document model and RELS-EXT queries
//! - [`storage`]: priority-ordered adapter chains
//! - [`cache`] / [`lock`]: shared result cache and single-flight locks
//!
//! ```no_run
//! let parser = foxml::Config::default().build_parser();
//! let object = parser.parse("exports/test_1.xml", true)?;
//! if let Some(dc) = object.datastream("DC") {
//!     println!("{} {:?}", object.pid(), dc.content_uri());
//! }
//! # Ok::<(), foxml::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod lock;
pub mod model;
pub mod parser;
pub mod storage;
pub mod stream;

pub use config::{CacheConfig, Config, LockConfig, ParserConfig, StorageConfig};
pub use error::{Error, ResolutionError, Result, StructureError, SyntaxError};
pub use model::{Content, Datastream, DatastreamVersion, DigitalObject};
pub use parser::FoxmlParser;
pub use stream::Substream;
