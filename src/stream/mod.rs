//! Byte-stream plumbing: chunked input, offset reconciliation and
//! substream references into the source file.

pub mod offset;
pub mod source;
pub mod substream;

pub use offset::OffsetTracker;
pub use source::{ByteSource, ChunkReader, FileSource};
pub use substream::Substream;
