//! Flat datastream store
//!
//! Resolves `INTERNAL_ID` references (`<pid>+<datastream>+<version>`) to
//! files in a single directory, named either by the identifier itself or by
//! its Akubra-style encoded form, e.g.
//! `info%3Afedora%2Ftest%3A1%2FOBJ%2FOBJ.0`.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::LowLevelAdapter;
use crate::error::ResolutionError;

pub struct DirectoryDatastreamAdapter {
    base: PathBuf,
}

impl DirectoryDatastreamAdapter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        DirectoryDatastreamAdapter { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn candidates(&self, id: &str) -> Vec<PathBuf> {
        let mut names = Vec::with_capacity(2);
        if !id.contains('/') {
            names.push(self.base.join(id));
        }
        if let Some(encoded) = akubra_name(id) {
            names.push(self.base.join(encoded));
        }
        names
    }
}

impl LowLevelAdapter for DirectoryDatastreamAdapter {
    fn dereference(&self, id: &str) -> Result<String, ResolutionError> {
        self.candidates(id)
            .into_iter()
            .find(|path| path.is_file())
            .map(|path| path.to_string_lossy().into_owned())
            .ok_or_else(|| ResolutionError::DereferenceFailed { id: id.to_string() })
    }

    fn valid(&self) -> bool {
        self.base.is_dir()
    }
}

/// Encoded `info:fedora/<pid>/<datastream>/<version>` for a `+`-separated
/// internal identifier
fn akubra_name(id: &str) -> Option<String> {
    let mut parts = id.split('+');
    let (pid, datastream, version) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || pid.is_empty() || datastream.is_empty() || version.is_empty() {
        return None;
    }
    Some(encode(&format!("info:fedora/{pid}/{datastream}/{version}")))
}

/// Percent-encode everything but ASCII alphanumerics and `.-*_`
fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 2);
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'*' | b'_') {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}
