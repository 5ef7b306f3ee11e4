//! Content-stream tokenizer.
//!
//! Splits the raw bytes of one page content stream into opaque byte-slice
//! tokens. Unlike a full PDF lexer this tokenizer never decodes anything:
//! a literal string keeps its escapes, a hex string keeps its whitespace,
//! an array is one token delimiters included. The driver needs tokens it
//! can splice back together byte-exactly, so decoding is left to the
//! string codec.
//!
//! Token classification is by leading byte:
//! - `(` literal string, `<` hex string, `<<` dict open, `>>` dict close
//! - `[` array (nested strings and hex strings are skipped while seeking
//!   the matching `]`)
//! - `/` name
//! - anything else is an operator or number
//!
//! Whitespace (space, tab, CR, LF, NUL, FF) and `%` comments separate
//! tokens and are not emitted. Joining the output with single spaces and
//! re-tokenizing yields the same token sequence.

/// Kind of a content-stream token, derived from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(...)` literal string
    LiteralString,
    /// `<...>` hex string
    HexString,
    /// `[...]` array
    Array,
    /// `/Name`
    Name,
    /// `<<`
    DictOpen,
    /// `>>`
    DictClose,
    /// Operator or number
    Other,
}

/// Classify a token produced by [`tokenize`].
pub fn classify(token: &[u8]) -> TokenKind {
    match token.first() {
        Some(b'(') => TokenKind::LiteralString,
        Some(b'<') if token.get(1) == Some(&b'<') => TokenKind::DictOpen,
        Some(b'<') => TokenKind::HexString,
        Some(b'>') => TokenKind::DictClose,
        Some(b'[') => TokenKind::Array,
        Some(b'/') => TokenKind::Name,
        _ => TokenKind::Other,
    }
}

/// True when `token` is a `(...)` or `<...>` string operand.
pub fn is_string_token(token: &[u8]) -> bool {
    matches!(
        classify(token),
        TokenKind::LiteralString | TokenKind::HexString
    )
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'/' | b'%')
}

/// Split a content stream into opaque tokens.
///
/// Malformed input never panics or loops: an unterminated string or array
/// runs to the end of the stream, and a stray delimiter byte that cannot
/// start a token is skipped.
pub fn tokenize(raw: &[u8]) -> Vec<&[u8]> {
    let mut tokens = Vec::new();
    let n = raw.len();
    let mut i = 0;

    while i < n {
        let ch = raw[i];

        if is_whitespace(ch) {
            i += 1;
            continue;
        }

        // Comment: % to end of line, not emitted.
        if ch == b'%' {
            while i < n && raw[i] != b'\r' && raw[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if ch == b'(' {
            let end = scan_literal_string(raw, i);
            tokens.push(&raw[i..end]);
            i = end;
            continue;
        }

        // Hex string, unless this is the << dict delimiter.
        if ch == b'<' && raw.get(i + 1) != Some(&b'<') {
            let end = scan_hex_string(raw, i);
            tokens.push(&raw[i..end]);
            i = end;
            continue;
        }

        if ch == b'<' {
            tokens.push(&raw[i..i + 2]);
            i += 2;
            continue;
        }
        if ch == b'>' && raw.get(i + 1) == Some(&b'>') {
            tokens.push(&raw[i..i + 2]);
            i += 2;
            continue;
        }

        if ch == b'[' {
            let end = scan_array(raw, i);
            tokens.push(&raw[i..end]);
            i = end;
            continue;
        }

        if ch == b'/' {
            let mut end = i + 1;
            while end < n && !is_whitespace(raw[end]) && !is_delimiter(raw[end]) {
                end += 1;
            }
            tokens.push(&raw[i..end]);
            i = end;
            continue;
        }

        // Operator or number.
        let start = i;
        while i < n && !is_whitespace(raw[i]) && !is_delimiter(raw[i]) {
            i += 1;
        }
        if i > start {
            tokens.push(&raw[start..i]);
        } else {
            // Stray delimiter byte (unbalanced ) or ]); skip it.
            i += 1;
        }
    }

    tokens
}

/// Find the end of a `(...)` literal starting at `start`, honouring
/// backslash escapes and nested parentheses.
fn scan_literal_string(raw: &[u8], start: usize) -> usize {
    let n = raw.len();
    let mut i = start + 1;
    let mut depth = 1usize;
    while i < n && depth > 0 {
        match raw[i] {
            b'\\' => {
                // Escape consumes two bytes.
                i += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    i.min(n)
}

/// Find the end of a `<...>` hex string starting at `start`.
fn scan_hex_string(raw: &[u8], start: usize) -> usize {
    let n = raw.len();
    let mut i = start + 1;
    while i < n && raw[i] != b'>' {
        i += 1;
    }
    (i + 1).min(n)
}

/// Find the end of a `[...]` array starting at `start`. Strings and hex
/// strings inside the array are skipped wholesale so bracket bytes within
/// them cannot unbalance the depth count.
fn scan_array(raw: &[u8], start: usize) -> usize {
    let n = raw.len();
    let mut i = start + 1;
    let mut depth = 1usize;
    while i < n && depth > 0 {
        match raw[i] {
            b'(' => {
                i = scan_literal_string(raw, i);
                continue;
            }
            b'<' if raw.get(i + 1) != Some(&b'<') => {
                i = scan_hex_string(raw, i);
                continue;
            }
            b'[' => depth += 1,
            b']' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    i.min(n)
}

/// Join tokens with single spaces into a writable content stream.
pub fn join_tokens<T: AsRef<[u8]>>(tokens: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.iter().map(|t| t.as_ref().len() + 1).sum());
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        out.extend_from_slice(tok.as_ref());
    }
    out
}
