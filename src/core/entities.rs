//! XML Entity Decoding
//!
//! Handles the predefined entities (`&lt;` `&gt;` `&amp;` `&quot;` `&apos;`)
//! and numeric character references. Without a DTD any other entity is
//! undefined and rejected.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode character data, borrowing when no reference is present
#[inline]
pub fn decode_text(input: &[u8]) -> Result<Cow<'_, [u8]>, &'static str> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input).map(Cow::Owned)
}

fn decode_entities(input: &[u8]) -> Result<Vec<u8>, &'static str> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        let semi = memchr(b';', &input[pos..]).ok_or("unterminated entity reference")?;
        let entity = &input[pos + 1..pos + semi];
        let mut buf = [0u8; 4];
        result.extend_from_slice(decode_entity(entity, &mut buf)?);
        pos += semi + 1;
    }
    result.extend_from_slice(&input[pos..]);

    Ok(result)
}

fn decode_entity<'b>(entity: &[u8], buf: &'b mut [u8; 4]) -> Result<&'b [u8], &'static str> {
    let c = match entity {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"quot" => '"',
        b"apos" => '\'',
        [b'#', b'x', hex @ ..] => parse_char_ref(hex, 16)?,
        [b'#', dec @ ..] => parse_char_ref(dec, 10)?,
        _ => return Err("undefined entity"),
    };
    Ok(c.encode_utf8(buf).as_bytes())
}

fn parse_char_ref(digits: &[u8], radix: u32) -> Result<char, &'static str> {
    let digits = std::str::from_utf8(digits).map_err(|_| "invalid character reference")?;
    let code = u32::from_str_radix(digits, radix).map_err(|_| "invalid character reference")?;
    char::from_u32(code)
        .filter(|&c| is_xml_char(c))
        .ok_or("reference to invalid character")
}

/// XML 1.0 `Char` production
#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
