//! Byte Sources
//!
//! Where parse input comes from. The orchestrator reads fixed-size chunks
//! from a source and marks the short read at end of input as final.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Opens parse targets for reading
pub trait ByteSource: Send + Sync {
    fn open(&self, target: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// Reads targets straight from the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl ByteSource for FileSource {
    fn open(&self, target: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(target)?))
    }
}

/// Fixed-size chunk reader over any [`Read`]
pub struct ChunkReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    eof: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        ChunkReader {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            eof: false,
        }
    }

    /// Read the next chunk, returning it with a flag set once input is
    /// exhausted. Short reads from the underlying reader are retried until
    /// the buffer is full, so only the last chunk is ever partial.
    pub fn next_chunk(&mut self) -> io::Result<Option<(&[u8], bool)>> {
        if self.eof {
            return Ok(None);
        }

        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.eof = filled < self.buffer.len();
        Ok(Some((&self.buffer[..filled], self.eof)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out at most `step` bytes per call
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_chunks_are_full_until_last() {
        let data = b"abcdefghij";
        let mut reader = ChunkReader::with_capacity(Trickle { data, step: 3 }, 4);

        let mut chunks = Vec::new();
        while let Some((chunk, is_final)) = reader.next_chunk().unwrap() {
            chunks.push((chunk.to_vec(), is_final));
        }
        assert_eq!(
            chunks,
            vec![
                (b"abcd".to_vec(), false),
                (b"efgh".to_vec(), false),
                (b"ij".to_vec(), true),
            ]
        );
    }

    #[test]
    fn test_exact_multiple_ends_with_empty_final() {
        let mut reader = ChunkReader::with_capacity(&b"abcd"[..], 2);
        assert_eq!(reader.next_chunk().unwrap(), Some((&b"ab"[..], false)));
        assert_eq!(reader.next_chunk().unwrap(), Some((&b"cd"[..], false)));
        assert_eq!(reader.next_chunk().unwrap(), Some((&b""[..], true)));
        assert_eq!(reader.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"<x/>").unwrap();

        let mut out = String::new();
        FileSource.open(file.path()).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "<x/>");
    }
}
