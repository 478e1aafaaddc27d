//! Start-tag Parsing
//!
//! Splits a complete start tag (`<name a="1" b='2'>` or `.../>`) into its
//! name and attributes, with strict well-formedness checks.

use super::entities::decode_text;
use super::scanner::{is_name_start_char, is_whitespace, Scanner};

/// A parsed start tag, names still in their qualified (prefixed) form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// A start-tag error: message and byte offset within the tag
pub type TagError = (&'static str, usize);

/// Parse `tag`, which must run from the opening '<' through the closing '>'
pub fn parse_start_tag(tag: &[u8]) -> Result<StartTag<'_>, TagError> {
    let mut scanner = Scanner::at(tag, 1);
    let name = scanner.read_name().ok_or(("invalid element name", 1))?;
    let name = as_utf8(name, 1)?;

    let close = tag.len() - 1;
    let self_closing = close > 0 && tag[close - 1] == b'/';
    let attrs_end = if self_closing { close - 1 } else { close };

    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
        let before_ws = scanner.position();
        scanner.skip_whitespace();
        let pos = scanner.position();
        if pos >= attrs_end {
            break;
        }
        if pos == before_ws {
            return Err(("expected whitespace before attribute", pos));
        }
        if !is_name_start_char(tag[pos]) {
            return Err(("invalid attribute name", pos));
        }

        let attr_name = scanner.read_name().ok_or(("invalid attribute name", pos))?;
        let attr_name = as_utf8(attr_name, pos)?;

        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err(("expected '=' after attribute name", scanner.position()));
        }
        scanner.advance(1);
        scanner.skip_whitespace();

        let quote = match scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(("attribute value must be quoted", scanner.position())),
        };
        scanner.advance(1);
        let value_start = scanner.position();
        let value_end = scanner
            .find_byte(quote)
            .filter(|&end| end < attrs_end)
            .ok_or(("unterminated attribute value", value_start))?;
        let raw = &tag[value_start..value_end];
        if raw.contains(&b'<') {
            return Err(("'<' not allowed in attribute value", value_start));
        }
        let value = normalize(raw, value_start)?;
        scanner.set_position(value_end + 1);

        if attributes.iter().any(|(n, _)| n == attr_name) {
            return Err(("duplicate attribute", pos));
        }
        attributes.push((attr_name.to_string(), value));
    }

    Ok(StartTag {
        name,
        attributes,
        self_closing,
    })
}

/// Entity-decode an attribute value and normalize literal whitespace to spaces
fn normalize(raw: &[u8], offset: usize) -> Result<String, TagError> {
    let mapped: Vec<u8> = raw
        .iter()
        .map(|&b| if is_whitespace(b) { b' ' } else { b })
        .collect();
    let decoded = decode_text(&mapped).map_err(|msg| (msg, offset))?;
    String::from_utf8(decoded.into_owned()).map_err(|_| ("invalid UTF-8 in attribute value", offset))
}

fn as_utf8(bytes: &[u8], offset: usize) -> Result<&str, TagError> {
    std::str::from_utf8(bytes).map_err(|_| ("invalid UTF-8 in name", offset))
}
