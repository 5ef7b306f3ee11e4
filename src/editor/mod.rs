//! Span editing: content-stream surgery with a redact-and-reinsert
//! fallback.
//!
//! The flow for one edit request:
//!
//! ```text
//! locate logical span ──► pure text change? ──► stream surgery ──► save
//!                              │ no / failed
//!                              ▼
//!                     redact span region
//!                              ▼
//!            reinsert (embedded font, else Base14) ──► save
//! ```
//!
//! Surgery is only attempted for non-empty replacements with no style
//! overrides, and preserves the original font, encoding, and position
//! exactly. The fallback trades some fidelity for generality.

pub mod fallback;
pub mod replace;

use crate::content::tokenizer::{join_tokens, tokenize};
use crate::error::{Error, Result};
use crate::fonts::FontResolver;
use crate::layout::{self, LogicalSpan};
use crate::models::{hex_to_rgb, int_to_hex_color, EditRequest};
use crate::render::{Color, DocumentSession, RenderBackend};

pub use fallback::redact_and_reinsert;
pub use replace::replace_in_stream;

/// Attempt to replace `target_text` with `new_text` directly in the
/// page's content stream. Returns `true` when the stream was rewritten.
///
/// Multi-line targets cross `BT..ET` boundaries and are not attempted.
/// Renderer failures are treated as "could not edit" rather than errors:
/// the caller falls back to redact-and-reinsert either way.
pub fn try_direct_edit(
    session: &mut dyn DocumentSession,
    page: usize,
    target_text: &str,
    new_text: &str,
) -> bool {
    if target_text.contains('\n') {
        return false;
    }
    match direct_edit(session, page, target_text, new_text) {
        Ok(done) => done,
        Err(e) => {
            log::debug!("stream surgery aborted: {e}");
            false
        }
    }
}

fn direct_edit(
    session: &mut dyn DocumentSession,
    page: usize,
    target_text: &str,
    new_text: &str,
) -> Result<bool> {
    session.clean_contents(page)?;
    let Some(&xref) = session.content_xrefs(page)?.first() else {
        return Ok(false);
    };
    let raw = session.xref_stream(xref)?;
    if raw.is_empty() {
        return Ok(false);
    }

    let mut tokens: Vec<Vec<u8>> = tokenize(&raw).into_iter().map(<[u8]>::to_vec).collect();

    let replaced = {
        let mut resolver = FontResolver::new(&*session, page);
        replace_in_stream(&mut tokens, target_text, new_text, &mut resolver)?
    };
    if !replaced {
        return Ok(false);
    }

    session.update_stream(xref, &join_tokens(&tokens))?;
    log::debug!("stream surgery rewrote xref {xref} on page {page}");
    Ok(true)
}

/// Resolved styling for one edit, derived from the request and the span.
struct EditStyle {
    text_only: bool,
    size: f32,
    color: Color,
}

fn resolve_style(req: &EditRequest, target: &LogicalSpan) -> Result<EditStyle> {
    let text_only = req.font.is_none() && req.size.is_none() && req.color.is_none();
    let size = req.size.unwrap_or(target.size);
    let color_hex = match &req.color {
        Some(hex) => hex.clone(),
        None => int_to_hex_color(target.color),
    };
    Ok(EditStyle {
        text_only,
        size,
        color: hex_to_rgb(&color_hex)?,
    })
}

/// Replace the text of the logical span at `span_index` on `page`.
///
/// The caller owns snapshotting and persistence ordering; this function
/// mutates the open session and saves incrementally on success.
pub fn edit_span(
    session: &mut dyn DocumentSession,
    backend: &dyn RenderBackend,
    page: usize,
    req: &EditRequest,
) -> Result<()> {
    let blocks = session.text_blocks(page)?;
    let target = layout::find(&blocks, req.span_index)
        .ok_or_else(|| Error::NotFound(format!("Span {} not found", req.span_index)))?;

    let style = resolve_style(req, &target)?;

    if style.text_only
        && !req.new_text.is_empty()
        && try_direct_edit(session, page, &target.text, &req.new_text)
    {
        session.save_incremental()?;
        return Ok(());
    }

    redact_and_reinsert(
        session,
        backend,
        page,
        &target,
        &req.new_text,
        req.font.as_deref(),
        style.size,
        style.color,
    )
    .map_err(|e| Error::EditFailed(e.to_string()))?;
    session.save_incremental()?;
    Ok(())
}
