//! One parse of one file: push-parser events in, a digital object out

use std::path::Path;

use super::automaton::{Context, Frame};
use super::element_map::canonicalize;
use crate::core::{EventSink, TextChunk};
use crate::error::{Error, Result};
use crate::model::{Attributes, DigitalObject};
use crate::storage::LowLevelAdapter;
use crate::stream::OffsetTracker;

pub struct Session<'a> {
    target: &'a Path,
    datastreams: Option<&'a dyn LowLevelAdapter>,
    tracker: OffsetTracker,
    root: Frame,
}

impl<'a> Session<'a> {
    /// `datastreams` is `None` when no valid adapter is configured
    pub fn new(target: &'a Path, datastreams: Option<&'a dyn LowLevelAdapter>) -> Self {
        Session {
            target,
            datastreams,
            tracker: OffsetTracker::new(),
            root: Frame::document(),
        }
    }

    /// Record that `n` more bytes are about to be fed to the parser
    pub fn advance_read(&mut self, n: usize) {
        self.tracker.advance_read(n);
    }

    fn context(&mut self, index: i32) -> Context<'a> {
        self.tracker.set_reported(index);
        Context {
            target: self.target,
            offset: self.tracker.offset(),
            datastreams: self.datastreams,
        }
    }

    /// The assembled object, if the document held one
    pub fn finish(self) -> Result<DigitalObject> {
        let target = self.target;
        self.root.into_object().ok_or_else(|| Error::NoDocument {
            target: target.to_path_buf(),
        })
    }
}

impl EventSink for Session<'_> {
    fn start_element(&mut self, index: i32, name: &str, attributes: Vec<(String, String)>) -> Result<()> {
        let ctx = self.context(index);
        self.root.tag_open(&ctx, &canonicalize(name), Attributes::from(attributes))
    }

    fn end_element(&mut self, index: i32, name: &str) -> Result<()> {
        let ctx = self.context(index);
        self.root.tag_close(&ctx, &canonicalize(name))
    }

    fn characters(&mut self, index: i32, text: &TextChunk<'_>) -> Result<()> {
        let ctx = self.context(index);
        self.root.characters(&ctx, text);
        Ok(())
    }

    fn markup(&mut self, index: i32) -> Result<()> {
        let ctx = self.context(index);
        self.root.markup(&ctx);
        Ok(())
    }
}
