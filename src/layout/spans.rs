//! Logical-span extraction.
//!
//! The renderer's block/line/span tree is a drawing-order artifact: one
//! heading may arrive as two blocks ("2" and "Background"), a bullet list
//! as one block of six lines. Editing needs the user-visible units
//! instead. This module merges, splits, and orders the raw tree into
//! *logical spans* — the headings, paragraphs, and bullet points a user
//! would point at.
//!
//! The pipeline per page:
//! 1. keep text blocks only, drop empty lines;
//! 2. merge consecutive lines of a block that share a visual row;
//! 3. split blocks at bullet markers, or at vertical gaps larger than
//!    the preceding line height;
//! 4. sort all items by `(y0, x0)` and merge same-row neighbours that
//!    nearly touch (the split-heading repair);
//! 5. index the result in reading order.
//!
//! Extraction is total: malformed trees yield fewer spans, never errors.

use bitflags::bitflags;
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::SYMBOL_FONT_HINTS;
use crate::geometry::Rect;
use crate::render::{BlockKind, RawBlock, RawLine, RawSpan};

bitflags! {
    /// Style bits as reported by the renderer's span dictionaries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpanFlags: u32 {
        /// Superscript placement
        const SUPERSCRIPT = 1;
        /// Italic face
        const ITALIC = 1 << 1;
        /// Serifed face
        const SERIF = 1 << 2;
        /// Monospaced face
        const MONOSPACE = 1 << 3;
        /// Bold face
        const BOLD = 1 << 4;
    }
}

/// One user-visible editable unit of a page.
#[derive(Debug, Clone)]
pub struct LogicalSpan {
    /// Zero-based position in reading order
    pub index: usize,
    /// Item text; wrapped bullet items embed newlines
    pub text: String,
    /// Union of the contributing line bboxes
    pub bbox: Rect,
    /// Font name of the item's first non-empty span
    pub font: String,
    /// Font size of that span in points
    pub size: f32,
    /// Packed `0xRRGGBB` color of that span
    pub color: u32,
    /// Style bitmask of that span
    pub flags: u32,
}

impl LogicalSpan {
    /// Typed view of the style bitmask. Unknown bits are dropped.
    pub fn style(&self) -> SpanFlags {
        SpanFlags::from_bits_truncate(self.flags)
    }
}

lazy_static! {
    // Leading bullet markers: common Unicode bullets, Private Use Area
    // codepoints (symbol fonts map bullets there), dash/asterisk plus
    // space, and numbered or lettered list markers.
    static ref BULLET_MARKER: Regex = Regex::new(
        r"^\s*(?:[\x{2022}\x{2023}\x{25E6}\x{2043}\x{2219}\x{B7}\x{25AA}\x{25B8}\x{25BA}\x{25CB}\x{25CF}]|[\x{E000}-\x{F8FF}]|[\x{2013}\x{2014}\-\*]\s|[0-9]+[.)]\s|[A-Za-z][.)]\s)"
    )
    .unwrap();
}

/// Style attributes of the first non-empty span of a line or group.
#[derive(Debug, Clone)]
struct SpanStyle {
    font: String,
    size: f32,
    color: u32,
    flags: u32,
}

impl SpanStyle {
    fn of(span: &RawSpan) -> Self {
        Self {
            font: span.font.clone(),
            size: span.size,
            color: span.color,
            flags: span.flags,
        }
    }
}

/// One collected line of a block.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    bbox: Rect,
    is_bullet: bool,
    style: SpanStyle,
}

/// One logical item before indexing.
#[derive(Debug, Clone)]
struct Item {
    text: String,
    bbox: Rect,
    style: SpanStyle,
}

/// Whether a raw line opens a bullet item.
fn line_is_bullet(line: &RawLine) -> bool {
    for span in &line.spans {
        if span.text.trim().is_empty() {
            continue;
        }
        let font_key: String = span
            .font
            .to_lowercase()
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        if SYMBOL_FONT_HINTS.iter().any(|hint| font_key.contains(hint)) {
            return true;
        }
        // Only the first non-empty span decides.
        return BULLET_MARKER.is_match(&span.text);
    }
    false
}

/// Separator between two merged fragments: nothing when either side
/// already carries an edge space.
fn merge_sep(left: &str, right: &str) -> &'static str {
    if left.ends_with(' ') || right.starts_with(' ') {
        ""
    } else {
        " "
    }
}

/// Collect a block's lines, merging consecutive lines that share a
/// visual row. Whitespace-only lines are dropped.
fn collect_block_lines(block: &RawBlock) -> Vec<Line> {
    let mut raw_lines: Vec<Line> = Vec::new();
    for line in &block.lines {
        let text: String = line.spans.iter().map(|s| s.text.as_str()).collect();
        if text.trim().is_empty() {
            continue;
        }
        let Some(first) = line.spans.iter().find(|s| !s.text.trim().is_empty()) else {
            continue;
        };
        raw_lines.push(Line {
            text,
            bbox: line.bbox,
            is_bullet: line_is_bullet(line),
            style: SpanStyle::of(first),
        });
    }

    if raw_lines.len() <= 1 {
        return raw_lines;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(raw_lines.len());
    for line in raw_lines {
        if let Some(prev) = lines.last_mut() {
            if prev.bbox.same_row(&line.bbox) {
                let sep = merge_sep(&prev.text, &line.text);
                prev.text = format!("{}{}{}", prev.text, sep, line.text);
                prev.bbox = prev.bbox.union(&line.bbox);
                continue;
            }
        }
        lines.push(line);
    }
    lines
}

/// Split one block into logical items.
///
/// Blocks with bullets split at each bullet line; non-bullet lines
/// continue the previous item. Blocks without bullets split at vertical
/// gaps larger than the preceding line's height, which keeps
/// independently added texts apart even when the renderer groups them.
fn split_block(block: &RawBlock) -> Vec<Item> {
    let lines = collect_block_lines(block);
    if lines.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<Vec<Line>> = Vec::new();
    let has_bullets = lines.iter().any(|l| l.is_bullet);

    for line in lines {
        let starts_group = match groups.last() {
            None => true,
            Some(group) if has_bullets => line.is_bullet && !group.is_empty(),
            Some(group) => {
                let prev = &group[group.len() - 1];
                line.bbox.y0 - prev.bbox.y1 > prev.bbox.height()
            }
        };
        if starts_group {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(line);
        }
    }

    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|group| {
            let text = group
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let bbox = group
                .iter()
                .skip(1)
                .fold(group[0].bbox, |acc, l| acc.union(&l.bbox));
            Item {
                text,
                bbox,
                style: group[0].style.clone(),
            }
        })
        .collect()
}

/// Collect all logical items of a page in reading order, repairing
/// same-row splits across blocks.
fn collect_page_items(blocks: &[RawBlock]) -> Vec<Item> {
    let mut raw: Vec<Item> = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Text)
        .flat_map(split_block)
        .collect();
    if raw.is_empty() {
        return raw;
    }

    raw.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut merged: Vec<Item> = Vec::with_capacity(raw.len());
    for item in raw {
        if let Some(prev) = merged.last_mut() {
            if prev.bbox.same_row(&item.bbox) {
                // Same row: merge only left-to-right neighbours closer
                // than the larger of the two font sizes, so multi-column
                // layouts stay apart.
                let h_gap = item.bbox.x0 - prev.bbox.x1;
                let max_gap = prev.style.size.max(item.style.size);
                if h_gap >= 0.0 && h_gap < max_gap {
                    let sep = merge_sep(&prev.text, &item.text);
                    prev.text = format!("{}{}{}", prev.text, sep, item.text);
                    prev.bbox = prev.bbox.union(&item.bbox);
                    continue;
                }
            }
        }
        merged.push(item);
    }
    merged
}

/// Extract the logical spans of a page from its raw text tree.
pub fn extract(blocks: &[RawBlock]) -> Vec<LogicalSpan> {
    collect_page_items(blocks)
        .into_iter()
        .enumerate()
        .map(|(index, item)| LogicalSpan {
            index,
            text: item.text,
            bbox: item.bbox,
            font: item.style.font,
            size: item.style.size,
            color: item.style.color,
            flags: item.style.flags,
        })
        .collect()
}

/// The logical span at `index`, or `None` when out of range.
pub fn find(blocks: &[RawBlock], index: usize) -> Option<LogicalSpan> {
    extract(blocks).into_iter().nth(index)
}
