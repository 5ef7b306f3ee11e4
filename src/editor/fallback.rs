//! Redact-and-reinsert fallback.
//!
//! When content-stream surgery cannot replace a span in place — the span
//! wraps across blocks, the font's codes cannot express the replacement,
//! or the caller changed style — the span's region is redacted and the
//! new text drawn over it. The original embedded font is preferred; a
//! Base14 substitute is the last resort. Raster images under the region
//! are never touched.

use crate::config::{LINE_HEIGHT_FACTOR, PAGE_MARGIN, TEXT_WIDTH_PADDING};
use crate::error::Result;
use crate::fonts::base14::{normalize_font, normalize_key, strip_subset_prefix};
use crate::fonts::embedded::EmbeddedFont;
use crate::geometry::{Point, Rect};
use crate::layout::LogicalSpan;
use crate::render::{Color, DocumentSession, RenderBackend, TextboxFit};

/// Extract the embedded font program matching the span's font name.
///
/// Candidates come from the page's font list; names are compared after
/// stripping any subset prefix and normalizing case, spaces, and dashes.
pub fn extract_matching_font(
    session: &dyn DocumentSession,
    page: usize,
    font_name: &str,
) -> Option<EmbeddedFont> {
    let target_key = normalize_key(font_name);
    let fonts = session.fonts(page).ok()?;
    for entry in &fonts {
        if entry.xref == 0 {
            continue;
        }
        let candidate = strip_subset_prefix(&entry.base_font);
        if normalize_key(candidate) != target_key {
            continue;
        }
        let Ok(file) = session.extract_font(entry.xref) else {
            continue;
        };
        if file.data.is_empty() || file.ext == "n/a" {
            continue;
        }
        if let Some(font) = EmbeddedFont::from_bytes(file.data) {
            return Some(font);
        }
    }
    None
}

/// Redact the span's region and draw `new_text` over it.
///
/// An empty `new_text` only redacts. When `font_override` is set the
/// embedded font is not attempted; the override's Base14 substitute is
/// used directly.
pub fn redact_and_reinsert(
    session: &mut dyn DocumentSession,
    backend: &dyn RenderBackend,
    page: usize,
    target: &LogicalSpan,
    new_text: &str,
    font_override: Option<&str>,
    size: f32,
    color: Color,
) -> Result<()> {
    // Extract before redacting; the font data stays in the document
    // either way, but the intent reads better.
    let embedded = match font_override {
        None => extract_matching_font(session, page, &target.font).filter(|font| {
            let usable = font.covers(new_text);
            if !usable {
                log::debug!(
                    "embedded font for {:?} lacks glyph coverage, using substitute",
                    target.font
                );
            }
            usable
        }),
        Some(_) => None,
    };

    session.add_redact_annot(page, target.bbox)?;
    session.apply_redactions_keep_images(page)?;

    if new_text.is_empty() {
        return Ok(());
    }

    if let Some(font) = &embedded {
        if insert_with_embedded(session, page, target.bbox, new_text, font, size, color)? {
            return Ok(());
        }
        log::warn!("embedded-font reinsertion failed, using Base14 substitute");
    }

    let base14 = normalize_font(font_override.unwrap_or(&target.font));
    insert_with_base14(session, backend, page, target.bbox, new_text, &base14, size, color)
}

/// Draw text with the extracted original font. Returns `Ok(false)` when
/// the renderer rejects the placement, so the caller can substitute.
fn insert_with_embedded(
    session: &mut dyn DocumentSession,
    page: usize,
    bbox: Rect,
    text: &str,
    font: &EmbeddedFont,
    size: f32,
    color: Color,
) -> Result<bool> {
    let page_rect = session.page_rect(page)?;

    if !text.contains('\n') {
        // Single line: direct glyph placement at the original baseline,
        // no wrapping. The bbox top is the top of ascenders.
        let baseline = Point::new(bbox.x0, bbox.y0 + font.ascender_fraction() * size);
        match session.place_text(page, baseline, text, font.data(), size, color) {
            Ok(()) => return Ok(true),
            Err(e) => {
                log::debug!("baseline placement failed: {e}");
                return Ok(false);
            }
        }
    }

    // Multi-line: grow the rectangle to hold every line unwrapped.
    let line_height = size * LINE_HEIGHT_FACTOR;
    let lines: Vec<&str> = text.split('\n').collect();
    let mut rect = bbox;

    let needed_height = line_height * lines.len() as f32;
    if rect.height() < needed_height {
        rect.y1 = rect.y0 + needed_height;
    }
    let max_line_width = lines
        .iter()
        .map(|line| font.text_width(line, size))
        .fold(0.0f32, f32::max);
    if max_line_width > rect.width() {
        rect.x1 = rect.x0 + max_line_width + TEXT_WIDTH_PADDING;
    }
    let mut rect = rect.clamp_to_page(&page_rect, PAGE_MARGIN);

    match session.fill_textbox(page, rect, text, font.data(), size, color) {
        Ok(TextboxFit::Fit) => Ok(true),
        Ok(TextboxFit::Overflow { lines }) => {
            // Retry once with room for the overflowed lines.
            rect.y1 = rect.y0 + line_height * (lines + 1) as f32;
            rect = rect.clamp_to_page(&page_rect, PAGE_MARGIN);
            session.fill_textbox(page, rect, text, font.data(), size, color)?;
            Ok(true)
        }
        Err(e) => {
            log::debug!("textbox fill failed: {e}");
            Ok(false)
        }
    }
}

/// Draw text with a Base14 substitute font.
fn insert_with_base14(
    session: &mut dyn DocumentSession,
    backend: &dyn RenderBackend,
    page: usize,
    bbox: Rect,
    text: &str,
    font_name: &str,
    size: f32,
    color: Color,
) -> Result<()> {
    let page_rect = session.page_rect(page)?;
    let line_height = size * LINE_HEIGHT_FACTOR;
    let mut rect = bbox;

    if rect.height() < line_height {
        rect.y1 = rect.y0 + line_height;
    }
    let text_width = backend.text_width(text, font_name, size);
    if text_width > rect.width() {
        rect.x1 = rect.x0 + text_width + TEXT_WIDTH_PADDING;
    }
    let mut rect = rect.clamp_to_page(&page_rect, PAGE_MARGIN);

    match session.insert_textbox(page, rect, text, font_name, size, color)? {
        TextboxFit::Fit => Ok(()),
        TextboxFit::Overflow { lines } => {
            rect.y1 = rect.y0 + line_height * (lines + 1) as f32;
            rect = rect.clamp_to_page(&page_rect, PAGE_MARGIN);
            session.insert_textbox(page, rect, text, font_name, size, color)?;
            Ok(())
        }
    }
}
