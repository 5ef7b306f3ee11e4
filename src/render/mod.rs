//! Renderer collaborator contract.
//!
//! The engine never parses whole PDF files itself: an external rendering
//! library owns document structure, decoding, redaction, and rasterised
//! output. These traits pin down exactly what the engine needs from it.
//! Page-level operations are flattened onto the document session (keyed by
//! page number) so one object carries the whole contract.
//!
//! Implementations wrap a real PDF library; the integration tests drive
//! the engine through a scripted in-memory implementation.

use std::path::Path;

use crate::error::Result;
use crate::geometry::{Point, Rect};

/// RGB color with unit-range components.
pub type Color = (f32, f32, f32);

/// One span of the renderer's raw text tree.
#[derive(Debug, Clone)]
pub struct RawSpan {
    /// Text with whitespace preserved
    pub text: String,
    /// Span bounding box
    pub bbox: Rect,
    /// Raw PDF font name
    pub font: String,
    /// Font size in points
    pub size: f32,
    /// Packed `0xRRGGBB` text color
    pub color: u32,
    /// Style bitmask as reported by the renderer
    pub flags: u32,
}

/// One line of the raw text tree.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// Line bounding box
    pub bbox: Rect,
    /// Spans in drawing order
    pub spans: Vec<RawSpan>,
}

/// Block kinds in the raw text tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Text block
    Text,
    /// Raster image block
    Image,
}

/// One block of the raw text tree.
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// Block kind; only text blocks carry lines
    pub kind: BlockKind,
    /// Block bounding box
    pub bbox: Rect,
    /// Lines in drawing order
    pub lines: Vec<RawLine>,
}

/// One entry of a page's font list.
#[derive(Debug, Clone)]
pub struct PageFont {
    /// Cross-reference number of the font object (0 when inline)
    pub xref: u32,
    /// Font file extension as reported by the renderer
    pub ext: String,
    /// Font subtype (`Type1`, `TrueType`, `Type0`, ...)
    pub subtype: String,
    /// `/BaseFont` value, subset prefix included
    pub base_font: String,
    /// Resource tag referenced by `Tf` operators (e.g. `F1`)
    pub tag: String,
    /// `/Encoding` name when the font list carries one
    pub encoding: Option<String>,
}

/// Outcome of placing text into a rectangle.
///
/// Renderers commonly signal "text did not fit" with a negative line
/// count; the contract here makes that explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextboxFit {
    /// All text was placed
    Fit,
    /// The given number of lines did not fit
    Overflow {
        /// Count of lines that overflowed the rectangle
        lines: u32,
    },
}

impl TextboxFit {
    /// True when all text was placed.
    pub fn fits(&self) -> bool {
        matches!(self, TextboxFit::Fit)
    }
}

/// An embedded font program extracted from the document.
#[derive(Debug, Clone)]
pub struct ExtractedFontFile {
    /// Base font name without resource tag
    pub base_name: String,
    /// Program type (`ttf`, `cff`, ... or `n/a` when not extractable)
    pub ext: String,
    /// Font subtype
    pub subtype: String,
    /// Raw font program bytes
    pub data: Vec<u8>,
}

/// One image placement on a page.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    /// Cross-reference number of the image object
    pub xref: u32,
    /// Placement rectangle in page space
    pub bbox: Rect,
    /// Pixel width of the underlying pixmap
    pub pixel_width: u32,
    /// Pixel height of the underlying pixmap
    pub pixel_height: u32,
}

/// One open document.
///
/// Sessions are not re-entrant; the engine serialises access per
/// document. All operations are synchronous and may block for tens of
/// milliseconds per page.
pub trait DocumentSession {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Page rectangle in points, origin top-left.
    fn page_rect(&self, page: usize) -> Result<Rect>;

    /// Raw block/line/span tree of a page with whitespace preserved.
    fn text_blocks(&self, page: usize) -> Result<Vec<RawBlock>>;

    /// Font list of a page.
    fn fonts(&self, page: usize) -> Result<Vec<PageFont>>;

    /// Source text of the object at `xref`.
    fn xref_object(&self, xref: u32) -> Result<String>;

    /// Decoded stream bytes of the object at `xref`.
    fn xref_stream(&self, xref: u32) -> Result<Vec<u8>>;

    /// Replace the stream bytes of the object at `xref`.
    fn update_stream(&mut self, xref: u32, data: &[u8]) -> Result<()>;

    /// Normalise a page's content into one decoded stream.
    fn clean_contents(&mut self, page: usize) -> Result<()>;

    /// Cross-reference numbers of a page's content streams.
    fn content_xrefs(&self, page: usize) -> Result<Vec<u32>>;

    /// Extract an embedded font program.
    fn extract_font(&self, xref: u32) -> Result<ExtractedFontFile>;

    /// Queue a redaction annotation over `rect`.
    fn add_redact_annot(&mut self, page: usize, rect: Rect) -> Result<()>;

    /// Apply queued redactions without touching raster images.
    fn apply_redactions_keep_images(&mut self, page: usize) -> Result<()>;

    /// Draw text into `rect` with a built-in Base14 font.
    fn insert_textbox(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        font_name: &str,
        size: f32,
        color: Color,
    ) -> Result<TextboxFit>;

    /// Place text at a baseline origin using an extracted font program,
    /// without wrapping.
    fn place_text(
        &mut self,
        page: usize,
        origin: Point,
        text: &str,
        font_data: &[u8],
        size: f32,
        color: Color,
    ) -> Result<()>;

    /// Fill `rect` with wrapped text using an extracted font program.
    fn fill_textbox(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        font_data: &[u8],
        size: f32,
        color: Color,
    ) -> Result<TextboxFit>;

    /// Draw an image into `rect`.
    fn insert_image(&mut self, page: usize, rect: Rect, image: &[u8]) -> Result<()>;

    /// Remove an image, leaving surrounding content untouched.
    fn delete_image(&mut self, page: usize, xref: u32) -> Result<()>;

    /// Image placements of a page in discovery order.
    fn images(&self, page: usize) -> Result<Vec<PlacedImage>>;

    /// Encoded bytes of the image object at `xref`.
    fn extract_image(&self, xref: u32) -> Result<Vec<u8>>;

    /// Pixel dimensions of an encoded image payload.
    fn image_size(&self, image: &[u8]) -> Result<(f32, f32)>;

    /// Render a page to PNG at the given scale.
    fn render_png(&self, page: usize, scale: f32) -> Result<Vec<u8>>;

    /// Append changes to the file this session was opened from,
    /// preserving existing encryption.
    fn save_incremental(&mut self) -> Result<()>;

    /// Serialise the document with garbage collection and deflate,
    /// returning the full new byte image.
    fn save_compacted(&mut self) -> Result<Vec<u8>>;
}

/// Factory and document-independent helpers of the rendering library.
pub trait RenderBackend: Send + Sync {
    /// Open a stored document.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentSession>>;

    /// Validate uploaded bytes as a PDF, returning its page count.
    fn probe(&self, bytes: &[u8]) -> Result<usize>;

    /// Measured width of `text` in a built-in Base14 font.
    fn text_width(&self, text: &str, font_name: &str, size: f32) -> f32;
}
