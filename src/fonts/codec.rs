//! PDF string codec: token bytes to Unicode text and back.
//!
//! Decoding strips the string-token delimiters, resolves literal escapes
//! or hex digits into raw bytes, and maps those bytes to text through the
//! font's simple encoding or its ToUnicode CMap. Encoding is the strict
//! inverse: if any character of the replacement cannot be expressed with
//! the original font's codes, the whole encode fails with
//! [`Error::EncodeImpossible`] and the caller falls back to
//! redact-and-reinsert.
//!
//! Content-stream bytes and decoded text never mix: everything on the
//! stream side is `&[u8]`/`Vec<u8>`, everything user-visible is `&str`.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::fonts::cmap::ToUnicodeCMap;
use crate::fonts::resolver::EncodingKind;

/// MacRoman 0x80..=0xFF to Unicode.
#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Unicode character for a MacRoman byte.
fn macroman_to_unicode(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        MAC_ROMAN_HIGH[(b - 0x80) as usize]
    }
}

/// MacRoman byte for a Unicode character, if one exists.
fn unicode_to_macroman(ch: char) -> Option<u8> {
    if (ch as u32) < 0x80 {
        return Some(ch as u8);
    }
    MAC_ROMAN_HIGH
        .iter()
        .position(|&c| c == ch)
        .map(|i| (i + 0x80) as u8)
}

/// Visual near-equivalents tried when a character has no code in the
/// target encoding: plain and typographic quotes/dashes, space and NBSP.
fn char_equivalents(ch: char) -> &'static [char] {
    match ch {
        ' ' => &['\u{A0}'],
        '\u{A0}' => &[' '],
        '\u{2018}' | '\u{2019}' => &['\''],
        '\'' => &['\u{2019}', '\u{2018}'],
        '\u{201C}' | '\u{201D}' => &['"'],
        '"' => &['\u{201D}', '\u{201C}'],
        '\u{2013}' | '\u{2014}' => &['-'],
        '-' => &['\u{2013}', '\u{2014}'],
        _ => &[],
    }
}

/// Raw bytes of a string token, or `None` when the token is not a
/// well-formed `(...)` or `<...>` string.
pub fn token_bytes(token: &[u8]) -> Option<Vec<u8>> {
    if token.len() >= 2 && token.starts_with(b"(") && token.ends_with(b")") {
        return Some(unescape_literal(&token[1..token.len() - 1]));
    }
    if token.len() >= 2 && token.starts_with(b"<") && token.ends_with(b">") {
        return decode_hex_body(&token[1..token.len() - 1]);
    }
    None
}

/// Resolve the backslash escapes of a literal string body.
fn unescape_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&next) = raw.get(i) else {
            break;
        };
        match next {
            b'n' => {
                out.push(b'\n');
                i += 1;
            }
            b'r' => {
                out.push(b'\r');
                i += 1;
            }
            b't' => {
                out.push(b'\t');
                i += 1;
            }
            b'b' => {
                out.push(0x08);
                i += 1;
            }
            b'f' => {
                out.push(0x0C);
                i += 1;
            }
            b'\\' | b'(' | b')' => {
                out.push(next);
                i += 1;
            }
            b'0'..=b'7' => {
                // One to three octal digits, masked to a byte.
                let mut value = u32::from(next - b'0');
                i += 1;
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            b'\r' => {
                // Line continuation; \r\n counts as one break.
                i += 1;
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {
                i += 1;
            }
            other => {
                // Unknown escape: the backslash is dropped.
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

/// Decode a hex string body, ignoring whitespace and padding a trailing
/// odd nibble with zero.
fn decode_hex_body(raw: &[u8]) -> Option<Vec<u8>> {
    let mut digits: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C))
        .collect();
    if digits.len() % 2 != 0 {
        digits.push(b'0');
    }
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
    }
    Some(out)
}

/// Decode a string token under a simple (non-CMap) font.
///
/// WinAnsi decodes as Latin-1 (the ranges that matter for editable text
/// coincide), MacRoman through its table, anything else as Latin-1.
pub fn decode_simple(token: &[u8], encoding: &EncodingKind) -> String {
    let Some(raw) = token_bytes(token) else {
        return String::new();
    };
    match encoding {
        EncodingKind::MacRoman => raw.iter().map(|&b| macroman_to_unicode(b)).collect(),
        _ => raw.iter().map(|&b| b as char).collect(),
    }
}

/// Decode a string token through a ToUnicode CMap.
///
/// Bytes are grouped into big-endian codes of `bytes_per_code` bytes. An
/// unmapped code in a one-byte font falls back to its literal codepoint;
/// unmapped two-byte codes are dropped.
pub fn decode_with_cmap(token: &[u8], cmap: &ToUnicodeCMap) -> String {
    let Some(raw) = token_bytes(token) else {
        return String::new();
    };
    let bpc = cmap.bytes_per_code();
    let mut out = String::new();
    let mut i = 0;
    while i + bpc <= raw.len() {
        let code = if bpc == 1 {
            u32::from(raw[i])
        } else {
            u32::from(BigEndian::read_u16(&raw[i..i + 2]))
        };
        match cmap.lookup(code) {
            Some(s) => out.push_str(s),
            None if bpc == 1 => out.push(raw[i] as char),
            None => {}
        }
        i += bpc;
    }
    out
}

/// Encode text as a literal string token under a simple font.
///
/// Returns [`Error::EncodeImpossible`] for the first character the
/// encoding cannot represent.
pub fn encode_simple(text: &str, encoding: &EncodingKind) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let byte = match encoding {
            EncodingKind::MacRoman => unicode_to_macroman(ch),
            _ => {
                let cp = ch as u32;
                (cp <= 0xFF).then_some(cp as u8)
            }
        };
        match byte {
            Some(b) => raw.push(b),
            None => return Err(Error::EncodeImpossible(ch)),
        }
    }
    Ok(literal_token(&raw))
}

/// Encode text through a CMap reverse map.
///
/// One-byte fonts yield a literal token, two-byte fonts an uppercase hex
/// token of the big-endian code bytes. Characters without a direct code
/// are retried through [`char_equivalents`] before failing.
pub fn encode_with_cmap(text: &str, cmap: &ToUnicodeCMap) -> Result<Vec<u8>> {
    let bpc = cmap.bytes_per_code();
    let mut raw = Vec::with_capacity(text.len() * bpc);
    for ch in text.chars() {
        let code = cmap.reverse_lookup(ch).or_else(|| {
            char_equivalents(ch)
                .iter()
                .find_map(|&alt| cmap.reverse_lookup(alt))
        });
        let Some(code) = code else {
            return Err(Error::EncodeImpossible(ch));
        };
        if bpc == 1 {
            if code > 0xFF {
                return Err(Error::EncodeImpossible(ch));
            }
            raw.push(code as u8);
        } else {
            let mut buf = [0u8; 2];
            BigEndian::write_u16(&mut buf, (code & 0xFFFF) as u16);
            raw.extend_from_slice(&buf);
        }
    }

    if bpc > 1 {
        let mut out = Vec::with_capacity(raw.len() * 2 + 2);
        out.push(b'<');
        for b in &raw {
            out.extend_from_slice(format!("{b:02X}").as_bytes());
        }
        out.push(b'>');
        return Ok(out);
    }
    Ok(literal_token(&raw))
}

/// Wrap raw bytes into a `(...)` token, escaping `\`, parens, CR and LF.
fn literal_token(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 2);
    out.push(b'(');
    for &b in raw {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out.push(b')');
    out
}
