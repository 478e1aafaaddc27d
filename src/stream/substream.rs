//! Lazily-read byte ranges of a source file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const SCHEME: &str = "substream:";

/// A `(path, start, length)` coordinate into a file
///
/// Nothing is read until [`Substream::open`] or [`Substream::read_to_vec`]
/// is called; the reference stays valid only as long as the file does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Substream {
    pub path: PathBuf,
    pub start: u64,
    pub length: u64,
}

impl Substream {
    pub fn new(path: impl Into<PathBuf>, start: u64, length: u64) -> Self {
        Substream {
            path: path.into(),
            start,
            length,
        }
    }

    /// Offset one past the last byte
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Open the source and position a reader over exactly this range
    pub fn open(&self) -> io::Result<io::Take<File>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.start))?;
        Ok(file.take(self.length))
    }

    pub fn read_to_vec(&self) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.length.min(1 << 20) as usize);
        self.open()?.read_to_end(&mut data)?;
        if (data.len() as u64) < self.length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} ended before byte {}", self.path.display(), self.end()),
            ));
        }
        Ok(data)
    }

    /// Parse the `substream:<start>:<length>:<path>` form
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(SCHEME)?;
        let (start, rest) = rest.split_once(':')?;
        let (length, path) = rest.split_once(':')?;
        if path.is_empty() {
            return None;
        }
        Some(Substream {
            path: Path::new(path).to_path_buf(),
            start: start.parse().ok()?,
            length: length.parse().ok()?,
        })
    }
}

impl fmt::Display for Substream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}:{}:{}", self.start, self.length, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789abcdef").unwrap();

        let substream = Substream::new(file.path(), 4, 6);
        assert_eq!(substream.read_to_vec().unwrap(), b"456789");
        assert_eq!(substream.end(), 10);
    }

    #[test]
    fn test_short_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123").unwrap();

        let err = Substream::new(file.path(), 2, 10).read_to_vec().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_uri_form() {
        let substream = Substream::new("/data/exports/obj:1.xml", 120, 44);
        let uri = substream.to_string();
        assert_eq!(uri, "substream:120:44:/data/exports/obj:1.xml");
        assert_eq!(Substream::parse(&uri), Some(substream));

        assert_eq!(Substream::parse("file:///x"), None);
        assert_eq!(Substream::parse("substream:1:x:/p"), None);
        assert_eq!(Substream::parse("substream:1:2:"), None);
    }
}
