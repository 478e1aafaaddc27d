//! SIMD-accelerated delimiter search over a partially received buffer
//!
//! Every lookup distinguishes "not present yet" from "present" so the push
//! parser can stop at an incomplete construct and wait for the next chunk.

use memchr::{memchr, memmem};

/// Scanner over the unconsumed part of a push-parser buffer
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Scanner positioned at `pos`
    #[inline]
    pub fn at(input: &'a [u8], pos: usize) -> Self {
        Scanner { input, pos }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip XML whitespace (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Whether the remaining input starts with `needle`
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Whether the remaining input is a strict prefix of `needle`, meaning
    /// more data is needed before the two can be compared.
    #[inline]
    pub fn is_prefix_of(&self, needle: &[u8]) -> bool {
        let rest = self.remaining();
        rest.len() < needle.len() && needle.starts_with(rest)
    }

    /// Absolute position of the next `byte`
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.remaining()).map(|i| self.pos + i)
    }

    /// Absolute position of the next occurrence of `needle`
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Absolute position of the '>' closing the current tag, skipping any
    /// '>' inside quoted attribute values.
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut quote: Option<u8> = None;
        for (i, &b) in self.remaining().iter().enumerate() {
            match (quote, b) {
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (Some(q), _) if q == b => quote = None,
                (None, b'>') => return Some(self.pos + i),
                _ => {}
            }
        }
        None
    }

    /// Absolute position of the '>' closing a DOCTYPE declaration, skipping
    /// over a bracketed internal subset.
    pub fn find_doctype_end(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (i, &b) in self.remaining().iter().enumerate() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Some(self.pos + i),
                _ => {}
            }
        }
        None
    }

    /// Read an XML name, advancing past it
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if !is_name_start_char(self.peek()?) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// ASCII letters, underscore, colon, and any non-ASCII (UTF-8) byte
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new(b"<a attr=\">test\" b='>'>content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(21));
    }

    #[test]
    fn test_find_tag_end_incomplete() {
        let scanner = Scanner::new(b"<a attr=\">test");
        assert_eq!(scanner.find_tag_end_quoted(), None);
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"foxml:datastream ID=\"DC\">");
        assert_eq!(scanner.read_name(), Some(b"foxml:datastream" as &[u8]));
        assert_eq!(scanner.position(), 16);
    }

    #[test]
    fn test_prefix_detection() {
        let scanner = Scanner::new(b"<![CD");
        assert!(scanner.is_prefix_of(b"<![CDATA["));
        assert!(!scanner.is_prefix_of(b"<!--"));
    }

    #[test]
    fn test_find_seq_and_doctype() {
        let scanner = Scanner::at(b"xx<!-- a > b -->tail", 2);
        assert_eq!(scanner.find_seq(b"-->"), Some(13));

        let doctype = Scanner::new(b"<!DOCTYPE x [<!ENTITY a \"b\">]><x/>");
        assert_eq!(doctype.find_doctype_end(), Some(29));
    }
}
