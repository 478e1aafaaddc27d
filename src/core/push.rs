//! Incremental Push Parser
//!
//! Accepts a document in arbitrarily sized chunks and reports element and
//! character events to an [`EventSink`] as soon as each construct is
//! complete. Consumed bytes are drained after every feed, so the buffer only
//! ever holds the unfinished tail of the input.
//!
//! Byte indices handed to the sink are 32-bit and wrap: a document larger
//! than 2 GiB produces negative (and eventually repeating) indices, which
//! [`crate::stream::offset`] reconciles against the true read position.
//!
//! - Tags report the index one past their closing `>`.
//! - Character data reports the index where the run begins; the index does
//!   not advance over pure character data.
//! - Comments and processing instructions report the index one past their
//!   closing delimiter through [`EventSink::markup`]. DOCTYPE declarations
//!   are consumed without an event.
//! - Comments, processing instructions and CDATA sections are consumed as
//!   they arrive; an unfinished one never holds more than its terminator's
//!   length in the buffer. CDATA text is reported in pieces whose source
//!   lengths add up to the whole section.

use memchr::{memchr, memchr_iter, memrchr};
use std::borrow::Cow;

use super::attributes::parse_start_tag;
use super::entities::decode_text;
use super::namespace::NamespaceResolver;
use super::scanner::{is_whitespace, Scanner};
use crate::error::{Error, Result, SyntaxError};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const DECLARATIONS: [&[u8]; 3] = [b"<!--", b"<![CDATA[", b"<!DOCTYPE"];

/// A run of decoded character data
#[derive(Debug)]
pub struct TextChunk<'a> {
    text: Cow<'a, str>,
    source_len: usize,
}

impl TextChunk<'_> {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the run in the source document, markup such as CDATA
    /// delimiters and unexpanded references included
    #[inline]
    pub fn source_len(&self) -> usize {
        self.source_len
    }
}

/// Receiver of parse events
///
/// Names are expanded to `namespace-uri:local-name` when the parser is
/// namespace aware. An error returned here aborts the parse.
pub trait EventSink {
    fn start_element(&mut self, index: i32, name: &str, attributes: Vec<(String, String)>) -> Result<()>;

    fn end_element(&mut self, index: i32, name: &str) -> Result<()>;

    fn characters(&mut self, index: i32, text: &TextChunk<'_>) -> Result<()>;

    /// A comment or processing instruction ended just before `index`
    fn markup(&mut self, _index: i32) -> Result<()> {
        Ok(())
    }
}

enum Step {
    Consumed(usize),
    NeedMore,
}

/// Markup whose opening delimiter has been consumed but whose terminator
/// has not arrived yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Comment,
    Instruction,
    Cdata,
}

impl Section {
    fn terminator(self) -> &'static [u8] {
        match self {
            Section::Comment => b"-->",
            Section::Instruction => b"?>",
            Section::Cdata => b"]]>",
        }
    }

    fn unclosed(self) -> &'static str {
        match self {
            Section::Comment => "unclosed comment",
            Section::Instruction => "unclosed processing instruction",
            Section::Cdata => "unclosed CDATA section",
        }
    }
}

pub struct PushParser {
    buffer: Vec<u8>,
    /// Wrapping byte index of `buffer[0]`
    base: u32,
    /// Line and column of `buffer[0]`
    line: u64,
    column: u64,
    /// Raw names of the open elements
    open: Vec<String>,
    namespaces: Option<NamespaceResolver>,
    section: Option<Section>,
    started: bool,
    seen_root: bool,
    finished: bool,
    failed: Option<SyntaxError>,
}

impl PushParser {
    pub fn new(namespace_aware: bool) -> Self {
        PushParser {
            buffer: Vec::new(),
            base: 0,
            line: 1,
            column: 1,
            open: Vec::new(),
            namespaces: namespace_aware.then(NamespaceResolver::new),
            section: None,
            started: false,
            seen_root: false,
            finished: false,
            failed: None,
        }
    }

    /// Feed the next chunk. `is_final` marks the end of input, after which
    /// the document must be complete.
    pub fn feed<S: EventSink + ?Sized>(&mut self, chunk: &[u8], is_final: bool, sink: &mut S) -> Result<()> {
        if let Some(err) = &self.failed {
            return Err(err.clone().into());
        }
        if self.finished {
            if chunk.is_empty() {
                return Ok(());
            }
            return Err(self.fail(&[], 0, "data after end of input"));
        }

        self.buffer.extend_from_slice(chunk);
        if !self.started {
            if !is_final && self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                return Ok(());
            }
            self.started = true;
            if self.buffer.starts_with(BOM) {
                self.buffer.drain(..BOM.len());
                self.base = BOM.len() as u32;
            }
        }

        let buffer = std::mem::take(&mut self.buffer);
        let outcome = self.run(&buffer, is_final, sink);
        self.buffer = buffer;

        match outcome {
            Ok(consumed) => {
                self.commit(consumed);
                Ok(())
            }
            Err(err) => {
                if self.failed.is_none() {
                    self.failed = Some(SyntaxError {
                        line: self.line,
                        column: self.column,
                        message: "parsing aborted by event handler".to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    /// Whether the final chunk has been accepted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn run<S: EventSink + ?Sized>(&mut self, buf: &[u8], is_final: bool, sink: &mut S) -> Result<usize> {
        let mut pos = 0;
        loop {
            match self.step(buf, pos, is_final, sink)? {
                Step::Consumed(next) => pos = next,
                Step::NeedMore => return Ok(pos),
            }
        }
    }

    fn step<S: EventSink + ?Sized>(&mut self, buf: &[u8], pos: usize, is_final: bool, sink: &mut S) -> Result<Step> {
        if let Some(section) = self.section {
            return self.section_body(section, buf, pos, is_final, sink);
        }
        if pos >= buf.len() {
            if is_final {
                self.finish(buf, pos)?;
            }
            return Ok(Step::NeedMore);
        }
        if buf[pos] != b'<' {
            return self.text(buf, pos, is_final, sink);
        }
        if pos + 1 == buf.len() {
            return self.incomplete(buf, pos, is_final, "unclosed markup");
        }

        let scanner = Scanner::at(buf, pos);
        match buf[pos + 1] {
            b'/' => self.end_tag(buf, pos, is_final, sink),
            b'?' => {
                self.section = Some(Section::Instruction);
                Ok(Step::Consumed(pos + 2))
            }
            b'!' if scanner.starts_with(b"<!--") => {
                self.section = Some(Section::Comment);
                Ok(Step::Consumed(pos + 4))
            }
            b'!' if scanner.starts_with(b"<![CDATA[") => self.cdata(buf, pos, is_final, sink),
            b'!' if scanner.starts_with(b"<!DOCTYPE") => {
                if self.seen_root {
                    return Err(self.fail(buf, pos, "DOCTYPE after document element"));
                }
                match Scanner::at(buf, pos + 9).find_doctype_end() {
                    Some(end) => Ok(Step::Consumed(end + 1)),
                    None => self.incomplete(buf, pos, is_final, "unclosed DOCTYPE declaration"),
                }
            }
            b'!' if DECLARATIONS.iter().any(|decl| scanner.is_prefix_of(decl)) => {
                self.incomplete(buf, pos, is_final, "unclosed markup")
            }
            b'!' => Err(self.fail(buf, pos, "invalid markup declaration")),
            _ => self.start_tag(buf, pos, is_final, sink),
        }
    }

    fn start_tag<S: EventSink + ?Sized>(&mut self, buf: &[u8], pos: usize, is_final: bool, sink: &mut S) -> Result<Step> {
        let Some(gt) = Scanner::at(buf, pos).find_tag_end_quoted() else {
            return self.incomplete(buf, pos, is_final, "unclosed start tag");
        };
        if self.seen_root && self.open.is_empty() {
            return Err(self.fail(buf, pos, "junk after document element"));
        }
        let tag = match parse_start_tag(&buf[pos..=gt]) {
            Ok(tag) => tag,
            Err((message, offset)) => return Err(self.fail(buf, pos + offset, message)),
        };
        self.seen_root = true;

        let mut attributes = tag.attributes;
        let name = match self.namespaces.as_mut() {
            Some(resolver) => {
                resolver.push_scope();
                resolver.declare_from(&mut attributes);
                for (attr, _) in attributes.iter_mut() {
                    *attr = resolver.expand_attribute(attr);
                }
                resolver.expand_element(tag.name)
            }
            None => tag.name.to_string(),
        };

        let index = self.index(gt + 1);
        self.open.push(tag.name.to_string());
        sink.start_element(index, &name, attributes)?;
        if tag.self_closing {
            self.close_scope();
            sink.end_element(index, &name)?;
        }
        Ok(Step::Consumed(gt + 1))
    }

    fn end_tag<S: EventSink + ?Sized>(&mut self, buf: &[u8], pos: usize, is_final: bool, sink: &mut S) -> Result<Step> {
        let mut scanner = Scanner::at(buf, pos + 2);
        let Some(gt) = scanner.find_byte(b'>') else {
            return self.incomplete(buf, pos, is_final, "unclosed end tag");
        };
        let name = match scanner.read_name().map(std::str::from_utf8) {
            Some(Ok(name)) => name,
            _ => return Err(self.fail(buf, pos + 2, "invalid element name")),
        };
        scanner.skip_whitespace();
        if scanner.position() != gt {
            return Err(self.fail(buf, scanner.position(), "invalid end tag"));
        }
        match self.open.last().map(|open| open == name) {
            Some(true) => {}
            Some(false) => return Err(self.fail(buf, pos, "mismatched tag")),
            None => return Err(self.fail(buf, pos, "unexpected end tag")),
        }

        let expanded = match &self.namespaces {
            Some(resolver) => resolver.expand_element(name),
            None => name.to_string(),
        };
        self.close_scope();
        sink.end_element(self.index(gt + 1), &expanded)?;
        Ok(Step::Consumed(gt + 1))
    }

    /// A CDATA section starting at `pos`. The opening delimiter stays in the
    /// buffer until some content can be reported along with it.
    fn cdata<S: EventSink + ?Sized>(&mut self, buf: &[u8], pos: usize, is_final: bool, sink: &mut S) -> Result<Step> {
        if self.open.is_empty() {
            return Err(self.fail(buf, pos, "CDATA section outside of document element"));
        }
        let content = pos + 9;
        if let Some(end) = Scanner::at(buf, content).find_seq(b"]]>") {
            self.cdata_piece(buf, pos, content..end, end + 3, sink)?;
            return Ok(Step::Consumed(end + 3));
        }
        if is_final {
            return Err(self.fail(buf, pos, Section::Cdata.unclosed()));
        }
        let stop = self.reportable(Section::Cdata, buf, content);
        if stop == content {
            return Ok(Step::NeedMore);
        }
        self.cdata_piece(buf, pos, content..stop, stop, sink)?;
        self.section = Some(Section::Cdata);
        Ok(Step::Consumed(stop))
    }

    /// Continue an unfinished section at `pos`
    fn section_body<S: EventSink + ?Sized>(
        &mut self,
        section: Section,
        buf: &[u8],
        pos: usize,
        is_final: bool,
        sink: &mut S,
    ) -> Result<Step> {
        let terminator = section.terminator();
        if let Some(end) = Scanner::at(buf, pos).find_seq(terminator) {
            let next = end + terminator.len();
            self.section = None;
            match section {
                Section::Cdata => self.cdata_piece(buf, pos, pos..end, next, sink)?,
                _ => sink.markup(self.index(next))?,
            }
            return Ok(Step::Consumed(next));
        }
        if is_final {
            return Err(self.fail(buf, pos, section.unclosed()));
        }
        let stop = self.reportable(section, buf, pos);
        if stop == pos {
            return Ok(Step::NeedMore);
        }
        if section == Section::Cdata {
            self.cdata_piece(buf, pos, pos..stop, stop, sink)?;
        }
        Ok(Step::Consumed(stop))
    }

    /// End of the part of an unterminated section body starting at `from`
    /// that can be consumed now: a possible start of the terminator is held
    /// back, and so is an incomplete UTF-8 sequence in CDATA text
    fn reportable(&self, section: Section, buf: &[u8], from: usize) -> usize {
        let from = from.min(buf.len());
        let stop = buf.len() - partial_suffix(&buf[from..], section.terminator());
        match section {
            Section::Cdata => stop - incomplete_utf8_tail(&buf[from..stop]),
            _ => stop,
        }
    }

    /// Report CDATA text `buf[text]` as a run covering `buf[start..next]`
    fn cdata_piece<S: EventSink + ?Sized>(
        &mut self,
        buf: &[u8],
        start: usize,
        text: std::ops::Range<usize>,
        next: usize,
        sink: &mut S,
    ) -> Result<()> {
        let at = text.start;
        let Ok(text) = std::str::from_utf8(&buf[text]) else {
            return Err(self.fail(buf, at, "invalid UTF-8 in character data"));
        };
        let chunk = TextChunk {
            text: Cow::Borrowed(text),
            source_len: next - start,
        };
        sink.characters(self.index(start), &chunk)
    }

    fn text<S: EventSink + ?Sized>(&mut self, buf: &[u8], pos: usize, is_final: bool, sink: &mut S) -> Result<Step> {
        let stop = match memchr(b'<', &buf[pos..]) {
            Some(lt) => pos + lt,
            None if is_final => buf.len(),
            None => pos + complete_prefix(&buf[pos..]),
        };
        if stop == pos {
            return Ok(Step::NeedMore);
        }

        let raw = &buf[pos..stop];
        if self.open.is_empty() {
            if raw.iter().all(|&b| is_whitespace(b)) {
                return Ok(Step::Consumed(stop));
            }
            let message = if self.seen_root {
                "junk after document element"
            } else {
                "text before document element"
            };
            return Err(self.fail(buf, pos, message));
        }

        let decoded = match decode_text(raw) {
            Ok(decoded) => decoded,
            Err(message) => return Err(self.fail(buf, pos, message)),
        };
        let text = match decoded {
            Cow::Borrowed(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Cow::Owned(bytes) => String::from_utf8(bytes).ok().map(Cow::Owned),
        };
        let Some(text) = text else {
            return Err(self.fail(buf, pos, "invalid UTF-8 in character data"));
        };

        let chunk = TextChunk {
            text,
            source_len: raw.len(),
        };
        sink.characters(self.index(pos), &chunk)?;
        Ok(Step::Consumed(stop))
    }

    fn finish(&mut self, buf: &[u8], pos: usize) -> Result<()> {
        if let Some(open) = self.open.last() {
            let message = format!("unclosed element <{open}>");
            return Err(self.fail(buf, pos, &message));
        }
        if !self.seen_root {
            return Err(self.fail(buf, pos, "no element found"));
        }
        self.finished = true;
        Ok(())
    }

    fn incomplete(&mut self, buf: &[u8], pos: usize, is_final: bool, message: &str) -> Result<Step> {
        if is_final {
            Err(self.fail(buf, pos, message))
        } else {
            Ok(Step::NeedMore)
        }
    }

    fn close_scope(&mut self) {
        self.open.pop();
        if let Some(resolver) = self.namespaces.as_mut() {
            resolver.pop_scope();
        }
    }

    #[inline]
    fn index(&self, pos: usize) -> i32 {
        self.base.wrapping_add(pos as u32) as i32
    }

    /// Line and column just past `consumed`, which starts at `buffer[0]`
    fn locate(&self, consumed: &[u8]) -> (u64, u64) {
        match memrchr(b'\n', consumed) {
            Some(last) => (
                self.line + memchr_iter(b'\n', consumed).count() as u64,
                (consumed.len() - last) as u64,
            ),
            None => (self.line, self.column + consumed.len() as u64),
        }
    }

    fn commit(&mut self, consumed: usize) {
        let (line, column) = self.locate(&self.buffer[..consumed]);
        self.line = line;
        self.column = column;
        self.buffer.drain(..consumed);
        self.base = self.base.wrapping_add(consumed as u32);
    }

    fn fail(&mut self, buf: &[u8], at: usize, message: &str) -> Error {
        let (line, column) = self.locate(&buf[..at.min(buf.len())]);
        let err = SyntaxError {
            line,
            column,
            message: message.to_string(),
        };
        self.failed = Some(err.clone());
        err.into()
    }
}

/// Length of the prefix of an unterminated text run that can be reported
/// now, holding back a trailing entity reference or UTF-8 sequence which
/// the next chunk may complete
fn complete_prefix(raw: &[u8]) -> usize {
    let mut end = raw.len();
    if let Some(amp) = memrchr(b'&', raw) {
        if memchr(b';', &raw[amp..]).is_none() {
            end = amp;
        }
    }
    end - incomplete_utf8_tail(&raw[..end])
}

/// Length of the longest suffix of `bytes` that is a proper prefix of
/// `terminator`
fn partial_suffix(bytes: &[u8], terminator: &[u8]) -> usize {
    (1..terminator.len())
        .rev()
        .find(|&n| bytes.ends_with(&terminator[..n]))
        .unwrap_or(0)
}

fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Start(i32, String, Vec<(String, String)>),
        End(i32, String),
        Text(i32, String, usize),
        Markup(i32),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl EventSink for Recorder {
        fn start_element(&mut self, index: i32, name: &str, attributes: Vec<(String, String)>) -> Result<()> {
            self.events.push(Event::Start(index, name.to_string(), attributes));
            Ok(())
        }

        fn end_element(&mut self, index: i32, name: &str) -> Result<()> {
            self.events.push(Event::End(index, name.to_string()));
            Ok(())
        }

        fn characters(&mut self, index: i32, text: &TextChunk<'_>) -> Result<()> {
            self.events.push(Event::Text(index, text.as_str().to_string(), text.source_len()));
            Ok(())
        }

        fn markup(&mut self, index: i32) -> Result<()> {
            self.events.push(Event::Markup(index));
            Ok(())
        }
    }

    fn parse(doc: &[u8], chunk_size: usize, namespace_aware: bool) -> Result<Vec<Event>> {
        let mut parser = PushParser::new(namespace_aware);
        let mut sink = Recorder::default();
        let chunks: Vec<&[u8]> = doc.chunks(chunk_size).collect();
        for chunk in &chunks {
            parser.feed(chunk, false, &mut sink)?;
        }
        parser.feed(&[], true, &mut sink)?;
        Ok(sink.events)
    }

    /// Tag names with adjacent text runs merged
    fn shape(events: &[Event]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for event in events {
            match event {
                Event::Start(_, name, _) => out.push(format!("<{name}")),
                Event::End(_, name) => out.push(format!("</{name}")),
                Event::Text(_, text, _) => match out.last_mut() {
                    Some(last) if last.starts_with('#') => last.push_str(text),
                    _ => out.push(format!("#{text}")),
                },
                Event::Markup(_) => {}
            }
        }
        out
    }

    fn syntax_error(result: Result<Vec<Event>>) -> SyntaxError {
        match result {
            Err(Error::Syntax(err)) => err,
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_indices() {
        let events = parse(b"<a><b>xy</b></a>", 1024, false).unwrap();
        assert_eq!(
            events,
            vec![
                Event::Start(3, "a".into(), vec![]),
                Event::Start(6, "b".into(), vec![]),
                Event::Text(6, "xy".into(), 2),
                Event::End(12, "b".into()),
                Event::End(16, "a".into()),
            ]
        );
    }

    #[test]
    fn test_chunking_does_not_change_events() {
        let doc = "<?xml version=\"1.0\"?>\n<!-- c -->\n<r a=\"1 &gt; 0\"><x>caf\u{e9} &amp; cr\u{e8}me</x><![CDATA[<raw>]]><y/></r>\n";
        let whole = parse(doc.as_bytes(), doc.len(), false).unwrap();
        for size in [1, 2, 3, 7] {
            let split = parse(doc.as_bytes(), size, false).unwrap();
            assert_eq!(shape(&split), shape(&whole), "chunk size {size}");
        }
        assert_eq!(
            shape(&whole),
            vec!["<r", "<x", "#caf\u{e9} & cr\u{e8}me", "</x", "#<raw>", "<y", "</y", "</r"]
        );
    }

    #[test]
    fn test_text_runs_are_contiguous() {
        let doc = b"<a>0123456789</a>";
        let events = parse(doc, 4, false).unwrap();
        let mut next = 3;
        for event in &events {
            if let Event::Text(index, _, len) = event {
                assert_eq!(*index, next);
                next += *len as i32;
            }
        }
        assert_eq!(next, 13);
    }

    #[test]
    fn test_cdata_source_length() {
        let events = parse(b"<a><![CDATA[x<y]]></a>", 1024, false).unwrap();
        assert_eq!(events[1], Event::Text(3, "x<y".into(), 15));
    }

    #[test]
    fn test_markup_reports_its_end() {
        let doc = b"<a><!-- c --><?pi x?></a>";
        let events = parse(doc, 1024, false).unwrap();
        assert_eq!(
            events,
            vec![
                Event::Start(3, "a".into(), vec![]),
                Event::Markup(13),
                Event::Markup(21),
                Event::End(25, "a".into()),
            ]
        );
        // Split anywhere, including inside the terminators
        for size in [1, 2, 5] {
            assert_eq!(parse(doc, size, false).unwrap(), events, "chunk size {size}");
        }
    }

    #[test]
    fn test_cdata_split_keeps_source_length() {
        let doc = b"<a><![CDATA[a]]]></a>";
        let whole = parse(doc, 1024, false).unwrap();
        assert_eq!(whole[1], Event::Text(3, "a]".into(), 14));

        for size in [1, 2, 4] {
            let events = parse(doc, size, false).unwrap();
            assert_eq!(shape(&events), vec!["<a", "#a]", "</a"], "chunk size {size}");
            let mut next = 3;
            for event in &events {
                if let Event::Text(index, _, len) = event {
                    assert_eq!(*index, next);
                    next += *len as i32;
                }
            }
            assert_eq!(next, 17, "chunk size {size}");
        }
    }

    #[test]
    fn test_long_sections_are_not_buffered() {
        let body = "x\u{e9}]".repeat(4096);
        let doc = format!("<a><![CDATA[{body}]]><!--{}--></a>", "-y".repeat(4096));
        let mut parser = PushParser::new(false);
        let mut sink = Recorder::default();
        for chunk in doc.as_bytes().chunks(64) {
            parser.feed(chunk, false, &mut sink).unwrap();
            assert!(parser.buffer.len() < 16, "buffer grew to {}", parser.buffer.len());
        }
        parser.feed(&[], true, &mut sink).unwrap();

        assert_eq!(shape(&sink.events), vec!["<a".to_string(), format!("#{body}"), "</a".to_string()]);
        let cdata_len: usize = sink
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Text(_, _, len) => Some(*len),
                _ => None,
            })
            .sum();
        assert_eq!(cdata_len, body.len() + 12);
        let comment_end = (3 + cdata_len + 4 + 8192 + 3) as i32;
        assert!(sink.events.contains(&Event::Markup(comment_end)));
    }

    #[test]
    fn test_unclosed_sections_at_end_of_input() {
        assert_eq!(syntax_error(parse(b"<a><![CDATA[abc", 4, false)).message, "unclosed CDATA section");
        assert_eq!(syntax_error(parse(b"<a><?pi", 2, false)).message, "unclosed processing instruction");
        assert_eq!(
            syntax_error(parse(b"<![CDATA[x]]><a/>", 1024, false)).message,
            "CDATA section outside of document element"
        );
    }

    #[test]
    fn test_namespace_expansion() {
        let events = parse(b"<f:x xmlns:f=\"urn:f\" f:attr=\"1\" plain=\"2\"/>", 1024, true).unwrap();
        assert_eq!(
            events,
            vec![
                Event::Start(
                    43,
                    "urn:f:x".into(),
                    vec![("urn:f:attr".into(), "1".into()), ("plain".into(), "2".into())]
                ),
                Event::End(43, "urn:f:x".into()),
            ]
        );
    }

    #[test]
    fn test_raw_names_without_namespaces() {
        let events = parse(b"<f:x xmlns:f=\"urn:f\"></f:x>", 1024, false).unwrap();
        assert_eq!(
            events[0],
            Event::Start(21, "f:x".into(), vec![("xmlns:f".into(), "urn:f".into())])
        );
        assert_eq!(events[1], Event::End(27, "f:x".into()));
    }

    #[test]
    fn test_bom_is_counted_but_skipped() {
        let events = parse(b"\xEF\xBB\xBF<a/>", 1, false).unwrap();
        assert_eq!(events[0], Event::Start(7, "a".into(), vec![]));
    }

    #[test]
    fn test_index_wraps() {
        let mut parser = PushParser::new(false);
        parser.base = i32::MAX as u32 - 1;
        let mut sink = Recorder::default();
        parser.feed(b"<a/>", true, &mut sink).unwrap();
        assert_eq!(sink.events[0], Event::Start(i32::MIN + 2, "a".into(), vec![]));
    }

    #[test]
    fn test_mismatched_tag_location() {
        let err = syntax_error(parse(b"<a>\n  <b></c></a>", 1024, false));
        assert_eq!(err.message, "mismatched tag");
        assert_eq!((err.line, err.column), (2, 6));
    }

    #[test]
    fn test_location_across_chunks() {
        let err = syntax_error(parse(b"<a>\n\n<b x=1/></a>", 2, false));
        assert_eq!(err.message, "attribute value must be quoted");
        assert_eq!((err.line, err.column), (3, 6));
    }

    #[test]
    fn test_structural_syntax_errors() {
        assert_eq!(syntax_error(parse(b"", 8, false)).message, "no element found");
        assert_eq!(syntax_error(parse(b"<a><b></b>", 8, false)).message, "unclosed element <a>");
        assert_eq!(syntax_error(parse(b"<a/><b/>", 8, false)).message, "junk after document element");
        assert_eq!(syntax_error(parse(b"hi<a/>", 8, false)).message, "text before document element");
        assert_eq!(syntax_error(parse(b"<a>&nbsp;</a>", 8, false)).message, "undefined entity");
        assert_eq!(syntax_error(parse(b"<a><!-- x", 8, false)).message, "unclosed comment");
        assert_eq!(syntax_error(parse(b"</a>", 8, false)).message, "unexpected end tag");
        assert_eq!(syntax_error(parse(b"<a><!bogus></a>", 8, false)).message, "invalid markup declaration");
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut parser = PushParser::new(false);
        let mut sink = Recorder::default();
        assert!(parser.feed(b"<a></b>", false, &mut sink).is_err());
        assert!(parser.feed(b"</a>", true, &mut sink).is_err());
    }

    #[test]
    fn test_trailing_whitespace_allowed() {
        let mut parser = PushParser::new(false);
        let mut sink = Recorder::default();
        parser.feed(b"<a/>\n\n", true, &mut sink).unwrap();
        assert!(parser.is_finished());
    }
}
