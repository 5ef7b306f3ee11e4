//! Request and response models of the HTTP collaborator.
//!
//! The engine itself works with the richer internal types; these are the
//! JSON shapes exchanged with clients. Colors cross the boundary as hex
//! `#rrggbb` strings.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_FONT, DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR};
use crate::error::{Error, Result};

/// Response to a successful document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// 16 lowercase hex characters identifying the document
    pub doc_id: String,
    /// Number of pages in the uploaded PDF
    pub page_count: usize,
}

/// One editable logical span of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    /// Zero-based position in reading order
    pub index: usize,
    /// Span text; wrapped bullet items embed newlines
    pub text: String,
    /// Bounding box `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// Raw PDF font name
    pub font: String,
    /// Base14 substitute identifier for the font
    pub normalized_font: String,
    /// Font size in points, rounded to two decimals
    pub size: f32,
    /// Text color as hex `#rrggbb`
    pub color: String,
    /// Style bitmask (bold/italic/etc.)
    pub flags: u32,
}

/// All logical spans of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page number
    pub page_num: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Spans in reading order
    pub spans: Vec<TextSpan>,
}

/// Request to replace the text of a logical span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// Index of the target span on the page
    pub span_index: usize,
    /// Replacement text; empty deletes the span
    pub new_text: String,
    /// Optional font override; forces the redact-and-reinsert path
    #[serde(default)]
    pub font: Option<String>,
    /// Optional size override; forces the redact-and-reinsert path
    #[serde(default)]
    pub size: Option<f32>,
    /// Optional `#rrggbb` color override; forces the redact-and-reinsert path
    #[serde(default)]
    pub color: Option<String>,
}

/// Request to add new text at a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTextRequest {
    /// Left edge of the new text box
    pub x: f32,
    /// Top edge of the new text box
    pub y: f32,
    /// Text to draw
    pub text: String,
    /// Font name, normalized to a Base14 identifier
    #[serde(default = "default_font")]
    pub font: String,
    /// Font size in points
    #[serde(default = "default_size")]
    pub size: f32,
    /// Color as hex `#rrggbb`
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

/// One image placement on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Zero-based placement index on the page
    pub index: usize,
    /// Placement rectangle `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// Placement width in points
    pub width: f32,
    /// Placement height in points
    pub height: f32,
    /// Cross-reference number of the image object
    pub xref: u32,
}

/// All image placements of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImages {
    /// Zero-based page number
    pub page_num: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Placements in discovery order
    pub images: Vec<ImagePlacement>,
}

/// Convert a packed `0xRRGGBB` color to a hex string.
pub fn int_to_hex_color(color: u32) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        (color >> 16) & 0xFF,
        (color >> 8) & 0xFF,
        color & 0xFF
    )
}

/// Parse a `#rrggbb` string into unit-range RGB components.
pub fn hex_to_rgb(hex: &str) -> Result<(f32, f32, f32)> {
    let h = hex.trim_start_matches('#');
    if h.len() != 6 || !h.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidRequest(format!("invalid color {hex:?}")));
    }
    let channel = |range| u8::from_str_radix(&h[range], 16).unwrap_or(0) as f32 / 255.0;
    Ok((channel(0..2), channel(2..4), channel(4..6)))
}
