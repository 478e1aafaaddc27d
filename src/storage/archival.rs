//! Archival export directory adapter
//!
//! Objects exported as individual FOXML files under one base directory.
//! Identifiers are paths relative to that base.

use regex_automata::meta::Regex;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::{IteratorKind, LowLevelAdapter, ObjectAdapter, ObjectEntry};
use crate::error::{Error, ResolutionError, Result};

pub struct ArchivalObjectAdapter {
    base: PathBuf,
    /// Matched against file names; directories are always descended
    pattern: Option<Regex>,
}

impl ArchivalObjectAdapter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        ArchivalObjectAdapter {
            base: base.into(),
            pattern: None,
        }
    }

    /// Only enumerate files whose name matches `pattern`
    pub fn with_pattern(base: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::Pattern(e.to_string()))?;
        Ok(ArchivalObjectAdapter {
            base: base.into(),
            pattern: Some(regex),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn accepts(&self, file_name: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(file_name))
    }
}

impl LowLevelAdapter for ArchivalObjectAdapter {
    fn dereference(&self, id: &str) -> std::result::Result<String, ResolutionError> {
        let failed = || ResolutionError::DereferenceFailed { id: id.to_string() };

        let relative = Path::new(id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if id.is_empty() || escapes {
            return Err(failed());
        }

        let path = self.base.join(relative);
        if !path.is_file() {
            return Err(failed());
        }
        Ok(path.to_string_lossy().into_owned())
    }

    fn valid(&self) -> bool {
        self.base.is_dir()
    }
}

impl ObjectAdapter for ArchivalObjectAdapter {
    fn iter(&self) -> Result<Box<dyn Iterator<Item = Result<ObjectEntry>> + '_>> {
        let walker = WalkDir::new(&self.base).follow_links(true).min_depth(1).sort_by_file_name();
        let entries = walker.into_iter().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(Error::Io(err.into()))),
            };
            if !entry.file_type().is_file() || !self.accepts(&entry.file_name().to_string_lossy()) {
                return None;
            }
            let relative = entry.path().strip_prefix(&self.base).unwrap_or(entry.path());
            Some(Ok(ObjectEntry::Pid(relative.to_string_lossy().into_owned())))
        });
        Ok(Box::new(entries))
    }

    fn iterator_kind(&self) -> IteratorKind {
        IteratorKind::Pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn export_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test_1.xml"), "<x/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("test_2.xml"), "<x/>").unwrap();
        dir
    }

    fn pids(adapter: &ArchivalObjectAdapter) -> Vec<String> {
        adapter
            .iter()
            .unwrap()
            .map(|entry| match entry.unwrap() {
                ObjectEntry::Pid(pid) => pid,
                other => panic!("unexpected entry {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_enumerates_recursively() {
        let dir = export_dir();
        let adapter = ArchivalObjectAdapter::new(dir.path());
        assert_eq!(pids(&adapter), vec!["nested/test_2.xml", "notes.txt", "test_1.xml"]);
    }

    #[test]
    fn test_filename_pattern() {
        let dir = export_dir();
        let adapter = ArchivalObjectAdapter::with_pattern(dir.path(), r"\.xml$").unwrap();
        assert_eq!(pids(&adapter), vec!["nested/test_2.xml", "test_1.xml"]);

        assert!(ArchivalObjectAdapter::with_pattern(dir.path(), "(").is_err());
    }

    #[test]
    fn test_dereference() {
        let dir = export_dir();
        let adapter = ArchivalObjectAdapter::new(dir.path());
        assert!(adapter.valid());

        let resolved = adapter.dereference("nested/test_2.xml").unwrap();
        assert_eq!(Path::new(&resolved), dir.path().join("nested/test_2.xml"));

        assert!(adapter.dereference("missing.xml").is_err());
        assert!(adapter.dereference("../escape.xml").is_err());
        assert!(adapter.dereference("nested").is_err());
    }

    #[test]
    fn test_missing_base_is_invalid() {
        let adapter = ArchivalObjectAdapter::new("/nonexistent/exports");
        assert!(!adapter.valid());
    }
}
