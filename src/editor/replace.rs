//! Two-pass replacement driver.
//!
//! Works on the token list of one cleaned content stream. Pass 1 looks
//! for a single `Tj`/`TJ` operand whose decoded, stripped text equals the
//! target; pass 2 accumulates whole `BT..ET` blocks and, when a block as
//! a whole matches, rewrites its first operand and blanks the rest.
//!
//! Both passes track the current font through `Tf` operators so operands
//! decode under the right encoding. Operands under a `Skip`-mode font are
//! excluded from matching without aborting the rest of the stream.
//!
//! Known limitation: when two distinct visible spans carry the same
//! stripped text (a repeated heading, say), the driver always edits the
//! earlier one. Disambiguating would require tracking the `Tm`/`Td` text
//! matrix against the span's bounding box.

use crate::content::tokenizer::{classify, is_string_token, TokenKind};
use crate::error::{Error, Result};
use crate::fonts::codec;
use crate::fonts::resolver::{FontMode, FontResolver};

/// Decode a string operand under the given font mode.
fn decode_token(token: &[u8], mode: &FontMode) -> String {
    match mode {
        FontMode::Direct(kind) => codec::decode_simple(token, kind),
        FontMode::Cmap(cmap) => codec::decode_with_cmap(token, cmap),
        FontMode::Skip => String::new(),
    }
}

/// Encode replacement text under the given font mode.
fn encode_text(text: &str, mode: &FontMode) -> Result<Vec<u8>> {
    match mode {
        FontMode::Direct(kind) => codec::encode_simple(text, kind),
        FontMode::Cmap(cmap) => codec::encode_with_cmap(text, cmap),
        FontMode::Skip => Err(Error::EncodeImpossible('\u{FFFD}')),
    }
}

/// String tokens inside a `TJ` array operand, in order. Numeric kerning
/// items are ignored.
fn extract_tj_strings(array: &[u8]) -> Vec<&[u8]> {
    if array.len() < 2 {
        return Vec::new();
    }
    let inner = &array[1..array.len() - 1];
    // The array body is itself token syntax; keep the string operands.
    crate::content::tokenizer::tokenize(inner)
        .into_iter()
        .filter(|t| is_string_token(t))
        .collect()
}

/// Decode the concatenated string pieces of a `TJ` array operand.
fn decode_tj_array(array: &[u8], mode: &FontMode) -> String {
    extract_tj_strings(array)
        .into_iter()
        .map(|part| decode_token(part, mode))
        .collect()
}

/// The font tag named by the `Tf` at `tokens[op_index]`, if well-formed.
fn tf_tag(tokens: &[Vec<u8>], op_index: usize) -> Option<String> {
    if op_index < 2 {
        return None;
    }
    let font_tok = &tokens[op_index - 2];
    if classify(font_tok) != TokenKind::Name || font_tok.len() < 2 {
        return None;
    }
    Some(String::from_utf8_lossy(&font_tok[1..]).into_owned())
}

/// Find the operand(s) drawing `target_text` and replace them with
/// `new_text`, re-encoded for the font in effect at the match site.
///
/// Returns `Ok(true)` when a replacement was made, `Ok(false)` when no
/// operand or block matched or the replacement cannot be encoded for the
/// matched font (the caller then falls back to redact-and-reinsert).
pub fn replace_in_stream(
    tokens: &mut [Vec<u8>],
    target_text: &str,
    new_text: &str,
    resolver: &mut FontResolver<'_>,
) -> Result<bool> {
    let target = target_text.trim();
    if target.is_empty() {
        return Ok(false);
    }

    if pass_single_operand(tokens, target, new_text, resolver)? {
        return Ok(true);
    }
    pass_block(tokens, target, new_text, resolver)
}

/// Pass 1: match one `Tj`/`TJ` operand directly.
fn pass_single_operand(
    tokens: &mut [Vec<u8>],
    target: &str,
    new_text: &str,
    resolver: &mut FontResolver<'_>,
) -> Result<bool> {
    let mut mode = FontMode::Direct(crate::fonts::EncodingKind::Unknown);

    for i in 0..tokens.len() {
        if tokens[i] == b"Tf" {
            if let Some(tag) = tf_tag(tokens, i) {
                mode = resolver.resolve(&tag);
            }
            continue;
        }
        if mode.is_skip() {
            continue;
        }

        if tokens[i] == b"Tj" && i >= 1 {
            let operand = &tokens[i - 1];
            if !is_string_token(operand) {
                continue;
            }
            if decode_token(operand, &mode).trim() == target {
                let new_tok = match encode_text(new_text, &mode) {
                    Ok(tok) => tok,
                    Err(Error::EncodeImpossible(ch)) => {
                        log::debug!("surgery: cannot encode {ch:?}, giving up");
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                };
                tokens[i - 1] = new_tok;
                return Ok(true);
            }
        }

        if tokens[i] == b"TJ" && i >= 1 {
            let operand = &tokens[i - 1];
            if classify(operand) != TokenKind::Array {
                continue;
            }
            if extract_tj_strings(operand).is_empty() {
                continue;
            }
            if decode_tj_array(operand, &mode).trim() == target {
                let new_tok = match encode_text(new_text, &mode) {
                    Ok(tok) => tok,
                    Err(Error::EncodeImpossible(ch)) => {
                        log::debug!("surgery: cannot encode {ch:?}, giving up");
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                };
                let mut wrapped = Vec::with_capacity(new_tok.len() + 2);
                wrapped.push(b'[');
                wrapped.extend_from_slice(&new_tok);
                wrapped.push(b']');
                tokens[i - 1] = wrapped;
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Recorded text-showing operand within a block.
#[derive(Debug, Clone, Copy)]
enum BlockOp {
    /// `Tj` with the operand's token index
    Show(usize),
    /// `TJ` with the array operand's token index
    ShowArray(usize),
}

/// Pass 2: match the concatenated text of a whole `BT..ET` block.
fn pass_block(
    tokens: &mut [Vec<u8>],
    target: &str,
    new_text: &str,
    resolver: &mut FontResolver<'_>,
) -> Result<bool> {
    let mut mode = FontMode::Direct(crate::fonts::EncodingKind::Unknown);
    let mut in_block = false;
    let mut block_mode = mode.clone();
    let mut block_text = String::new();
    let mut block_unsafe = false;
    let mut block_font_changes = 0usize;
    let mut block_ops: Vec<BlockOp> = Vec::new();

    for i in 0..tokens.len() {
        if tokens[i] == b"BT" {
            in_block = true;
            block_mode = mode.clone();
            block_text.clear();
            block_unsafe = mode.is_skip();
            block_font_changes = 0;
            block_ops.clear();
            continue;
        }

        if !in_block {
            if tokens[i] == b"Tf" {
                if let Some(tag) = tf_tag(tokens, i) {
                    mode = resolver.resolve(&tag);
                }
            }
            continue;
        }

        if tokens[i] == b"Tf" {
            if let Some(tag) = tf_tag(tokens, i) {
                block_font_changes += 1;
                let resolved = resolver.resolve(&tag);
                if resolved.is_skip() {
                    block_unsafe = true;
                } else {
                    block_mode = resolved;
                }
            }
            continue;
        }

        if !block_unsafe {
            if tokens[i] == b"Tj" && i >= 1 && is_string_token(&tokens[i - 1]) {
                block_text.push_str(&decode_token(&tokens[i - 1], &block_mode));
                block_ops.push(BlockOp::Show(i - 1));
            } else if tokens[i] == b"TJ"
                && i >= 1
                && classify(&tokens[i - 1]) == TokenKind::Array
            {
                block_text.push_str(&decode_tj_array(&tokens[i - 1], &block_mode));
                block_ops.push(BlockOp::ShowArray(i - 1));
            }
        }

        if tokens[i] == b"ET" {
            in_block = false;
            if block_unsafe || block_font_changes > 1 {
                continue;
            }
            if block_ops.is_empty() || block_text.trim().is_empty() {
                continue;
            }
            if block_text.trim() != target {
                continue;
            }

            let new_tok = match encode_text(new_text, &block_mode) {
                Ok(tok) => tok,
                Err(Error::EncodeImpossible(ch)) => {
                    log::debug!("surgery: cannot encode {ch:?}, giving up");
                    return Ok(false);
                }
                Err(e) => return Err(e),
            };

            for (k, op) in block_ops.iter().enumerate() {
                let replacement: Vec<u8> = match (k, op) {
                    (0, BlockOp::Show(_)) => new_tok.clone(),
                    (0, BlockOp::ShowArray(_)) => {
                        let mut w = Vec::with_capacity(new_tok.len() + 2);
                        w.push(b'[');
                        w.extend_from_slice(&new_tok);
                        w.push(b']');
                        w
                    }
                    (_, BlockOp::Show(_)) => b"()".to_vec(),
                    (_, BlockOp::ShowArray(_)) => b"[()]".to_vec(),
                };
                let idx = match op {
                    BlockOp::Show(idx) | BlockOp::ShowArray(idx) => *idx,
                };
                tokens[idx] = replacement;
            }
            return Ok(true);
        }
    }
    Ok(false)
}
