//! ToUnicode CMap parsing.
//!
//! A `/ToUnicode` stream maps font-specific character codes to Unicode
//! strings. For editing we need both directions: the forward map decodes
//! existing operands, the reverse map re-encodes replacement text with the
//! same character codes so the embedded font keeps rendering it.
//!
//! The parser is deliberately lenient: entries that fail UTF-16 decoding
//! are skipped, unknown directives are ignored, and a malformed stream
//! yields an empty map rather than an error.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Upper bound on codes materialized from a single bfrange entry. Real
/// ToUnicode ranges stay far below this; anything larger is malformed.
const MAX_RANGE_SPAN: u32 = 0x1_0000;

lazy_static! {
    static ref BFCHAR_SECTION: Regex =
        Regex::new(r"(?s)beginbfchar\s*(.*?)\s*endbfchar").unwrap();
    static ref BFRANGE_SECTION: Regex =
        Regex::new(r"(?s)beginbfrange\s*(.*?)\s*endbfrange").unwrap();
    static ref PAIR: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    static ref ARRAY_RANGE: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*\[([^\]]+)\]").unwrap();
    static ref SIMPLE_RANGE: Regex =
        Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    static ref HEX_ITEM: Regex = Regex::new(r"<([0-9A-Fa-f]+)>").unwrap();
}

/// Forward and reverse character maps derived from one `/ToUnicode` stream.
///
/// The forward map preserves document order so that when several codes map
/// to the same codepoint, the reverse map keeps the first one.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    forward: IndexMap<u32, String>,
    reverse: HashMap<char, u32>,
    bytes_per_code: usize,
}

impl ToUnicodeCMap {
    /// Parse a decoded CMap stream body.
    pub fn parse(data: &[u8]) -> Self {
        // Latin-1 view of the bytes: every byte becomes the codepoint of
        // the same value, which keeps hex sections intact for the regexes.
        let text: String = data.iter().map(|&b| b as char).collect();

        let mut forward: IndexMap<u32, String> = IndexMap::new();
        let mut src_hex_lengths: Vec<usize> = Vec::new();

        for section in BFCHAR_SECTION.captures_iter(&text) {
            for pair in PAIR.captures_iter(&section[1]) {
                let src_hex = &pair[1];
                let Ok(code) = u32::from_str_radix(src_hex, 16) else {
                    continue;
                };
                if let Some(dst) = hex_to_unicode(&pair[2]) {
                    src_hex_lengths.push(src_hex.len());
                    forward.insert(code, dst);
                }
            }
        }

        for section in BFRANGE_SECTION.captures_iter(&text) {
            let body = &section[1];

            // Array form first: <start> <end> [<u1> <u2> ...]
            for caps in ARRAY_RANGE.captures_iter(body) {
                let (Ok(start), Ok(end)) = (
                    u32::from_str_radix(&caps[1], 16),
                    u32::from_str_radix(&caps[2], 16),
                ) else {
                    continue;
                };
                src_hex_lengths.push(caps[1].len());
                for (offset, item) in HEX_ITEM.captures_iter(&caps[3]).enumerate() {
                    let code = start + offset as u32;
                    if code > end {
                        break;
                    }
                    if let Some(dst) = hex_to_unicode(&item[1]) {
                        forward.insert(code, dst);
                    }
                }
            }

            // The simple form must only match text left over after array
            // entries are removed, or it would match inside the brackets.
            let remaining = ARRAY_RANGE.replace_all(body, "");
            for caps in SIMPLE_RANGE.captures_iter(&remaining) {
                let (Ok(start), Ok(end)) = (
                    u32::from_str_radix(&caps[1], 16),
                    u32::from_str_radix(&caps[2], 16),
                ) else {
                    continue;
                };
                let Some(dst_start) = hex_to_unicode(&caps[3]) else {
                    continue;
                };
                let mut chars = dst_start.chars();
                let (Some(first), None) = (chars.next(), chars.next()) else {
                    // Multi-codepoint starts cannot be incremented.
                    continue;
                };
                if end < start {
                    continue;
                }
                if end - start >= MAX_RANGE_SPAN {
                    log::warn!(
                        "bfrange 0x{start:X}-0x{end:X} too large, truncating to {MAX_RANGE_SPAN} codes"
                    );
                }
                src_hex_lengths.push(caps[1].len());
                let span = (end - start).min(MAX_RANGE_SPAN - 1);
                for offset in 0..=span {
                    if let Some(ch) = char::from_u32(first as u32 + offset) {
                        forward.insert(start + offset, ch.to_string());
                    }
                }
            }
        }

        let bytes_per_code = match src_hex_lengths.iter().max() {
            Some(&max_len) => {
                let bytes = max_len.div_ceil(2).max(1);
                if bytes > 2 {
                    log::warn!("CMap source codes of {bytes} bytes, clamping to 2");
                }
                bytes.min(2)
            }
            None => 1,
        };

        let mut reverse: HashMap<char, u32> = HashMap::new();
        for (&code, dst) in &forward {
            let mut chars = dst.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                reverse.entry(ch).or_insert(code);
            }
        }

        ToUnicodeCMap {
            forward,
            reverse,
            bytes_per_code,
        }
    }

    /// Number of bytes per character code (1 for simple fonts, 2 for CID).
    pub fn bytes_per_code(&self) -> usize {
        self.bytes_per_code
    }

    /// True when parsing produced no forward mappings.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// True when at least one character can be re-encoded.
    pub fn has_reverse(&self) -> bool {
        !self.reverse.is_empty()
    }

    /// Unicode string for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.forward.get(&code).map(String::as_str)
    }

    /// Character code for a single Unicode character.
    pub fn reverse_lookup(&self, ch: char) -> Option<u32> {
        self.reverse.get(&ch).copied()
    }
}

/// Decode a hex string of UTF-16BE code units into a Unicode string.
fn hex_to_unicode(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        bytes.push(u8::from_str_radix(&hex[i..i + 2], 16).ok()?);
    }
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from(c[0]) << 8 | u16::from(c[1]))
        .collect();
    String::from_utf16(&units).ok()
}
