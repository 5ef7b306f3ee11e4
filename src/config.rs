//! Engine configuration and authoritative default constants.

use std::path::PathBuf;

/// Maximum accepted upload size in bytes (50 MiB).
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Maximum undo/redo snapshots kept per document.
pub const MAX_UNDO: usize = 20;

/// PNG render resolution multiplier.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Base14 identifier used when no better substitute is found.
pub const DEFAULT_FONT: &str = "helv";

/// Font size for newly added text.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Color for newly added text.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Inset from page edges when clamping rectangles, in points.
pub const PAGE_MARGIN: f32 = 5.0;

/// Reinsertion line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.3;

/// Height of new-text boxes as a multiple of the font size.
pub const TEXT_BOX_HEIGHT_FACTOR: f32 = 1.5;

/// Extra width in points when growing a rectangle for wider text.
pub const TEXT_WIDTH_PADDING: f32 = 2.0;

/// Default width in points for auto-scaled images.
pub const DEFAULT_IMAGE_WIDTH: f32 = 200.0;

/// Padding from the page edge for images, in points.
pub const IMAGE_PADDING: f32 = 10.0;

/// Minimum image dimension in points.
pub const MIN_IMAGE_SIZE: f32 = 10.0;

/// Substring patterns mapping normalized PDF font names to Base14
/// identifiers. Scanned in order; the first pattern contained in the
/// normalized name wins.
pub const FONT_MAP: &[(&str, &str)] = &[
    ("helv", "helv"),
    ("helvetica", "helv"),
    ("arial", "helv"),
    ("tisa", "helv"),
    ("times", "tiro"),
    ("timesnewroman", "tiro"),
    ("times-roman", "tiro"),
    ("courier", "cour"),
    ("couriernew", "cour"),
    ("symbol", "symb"),
    ("zapfdingbats", "zadb"),
];

/// Font-name fragments that mark a span as drawn in a symbol font.
/// A line whose first non-empty span uses one of these is a bullet.
pub const SYMBOL_FONT_HINTS: &[&str] =
    &["symbol", "zapf", "dingbat", "wingding", "webding", "bullet"];

/// Runtime configuration for an [`EditEngine`](crate::engine::EditEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding `<doc_id>.pdf` files.
    pub upload_dir: PathBuf,

    /// Render resolution multiplier for page PNGs.
    pub render_scale: f32,

    /// Maximum undo/redo snapshots kept per document.
    pub max_undo: usize,

    /// Maximum accepted upload size in bytes.
    pub max_upload_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("uploads")
    }
}

impl EngineConfig {
    /// Create a configuration with default limits rooted at `upload_dir`.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            render_scale: DEFAULT_RENDER_SCALE,
            max_undo: MAX_UNDO,
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }

    /// Override the render resolution multiplier.
    pub fn with_render_scale(mut self, scale: f32) -> Self {
        self.render_scale = scale;
        self
    }

    /// Override the undo/redo depth.
    pub fn with_max_undo(mut self, depth: usize) -> Self {
        self.max_undo = depth;
        self
    }

    /// Override the upload size limit.
    pub fn with_max_upload_size(mut self, bytes: usize) -> Self {
        self.max_upload_size = bytes;
        self
    }
}
