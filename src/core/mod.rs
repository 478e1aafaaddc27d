//! Core XML parsing primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Entities: strict entity decoding with Cow (zero-copy when possible)
//! - Attributes: start-tag splitting and attribute normalization
//! - Namespace: prefix resolution into expanded names
//! - Push: the incremental, chunk-fed event parser built from the above

pub mod attributes;
pub mod entities;
pub mod namespace;
pub mod push;
pub mod scanner;

pub use push::{EventSink, PushParser, TextChunk};
