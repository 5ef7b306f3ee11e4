//! Font resolution for content-stream surgery.
//!
//! For every `Tf` font tag met while walking a content stream, the driver
//! needs a verdict: can string operands under this font be decoded and
//! re-encoded byte-safely (`Direct`), only through the font's ToUnicode
//! CMap (`Cmap`), or not at all (`Skip`). Subset fonts, CID fonts, and
//! fonts with `/Differences` remap character codes away from any standard
//! encoding, so they are only editable when a usable CMap exists.
//!
//! Descriptors and parsed CMaps are cached per tag for the duration of
//! one edit. The cache is deliberately not process-wide: xrefs are only
//! meaningful within the document being edited, and stale hits would
//! mis-decode streams.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::fonts::cmap::ToUnicodeCMap;
use crate::render::DocumentSession;

lazy_static! {
    static ref ENCODING_NAME: Regex = Regex::new(r"/Encoding\s*/(\w+)").unwrap();
    static ref BASE_ENCODING_NAME: Regex = Regex::new(r"/BaseEncoding\s*/(\w+)").unwrap();
    static ref SUBTYPE_NAME: Regex = Regex::new(r"/Subtype\s*/(\w+)").unwrap();
    static ref TOUNICODE_REF: Regex = Regex::new(r"/ToUnicode\s+(\d+)\s+\d+\s+R").unwrap();
}

/// Simple-font encoding classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingKind {
    /// `/WinAnsiEncoding`
    WinAnsi,
    /// `/MacRomanEncoding`
    MacRoman,
    /// A named encoding this crate has no table for
    Other(String),
    /// No encoding entry present
    Unknown,
}

impl EncodingKind {
    fn from_name(name: &str) -> Self {
        match name {
            "WinAnsiEncoding" => EncodingKind::WinAnsi,
            "MacRomanEncoding" => EncodingKind::MacRoman,
            other => EncodingKind::Other(other.to_string()),
        }
    }
}

/// What the page resources say about one font tag.
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    /// Resource tag (e.g. `F1`)
    pub tag: String,
    /// `/BaseFont` value, subset prefix included
    pub base_font: String,
    /// Declared simple-font encoding
    pub encoding: EncodingKind,
    /// Composite (Type0/CIDFont) font
    pub is_cid: bool,
    /// `/BaseFont` carries a subset prefix
    pub is_subset: bool,
    /// Encoding carries a `/Differences` array
    pub has_differences: bool,
    /// Cross-reference of the `/ToUnicode` stream when present
    pub to_unicode_xref: Option<u32>,
}

impl FontDescriptor {
    /// True when character codes cannot be trusted to follow a standard
    /// simple encoding.
    pub fn needs_cmap(&self) -> bool {
        self.is_cid || self.is_subset || self.has_differences
    }
}

/// Editing verdict for one font tag.
#[derive(Debug, Clone)]
pub enum FontMode {
    /// Decode and encode through the simple encoding
    Direct(EncodingKind),
    /// Decode and encode through the ToUnicode CMap
    Cmap(Arc<ToUnicodeCMap>),
    /// Operands under this font are excluded from matching
    Skip,
}

impl FontMode {
    /// True for [`FontMode::Skip`].
    pub fn is_skip(&self) -> bool {
        matches!(self, FontMode::Skip)
    }
}

/// Per-edit resolver over one page's font resources.
pub struct FontResolver<'a> {
    session: &'a dyn DocumentSession,
    page: usize,
    modes: HashMap<String, FontMode>,
}

impl<'a> FontResolver<'a> {
    /// Create a resolver for one page of an open session.
    pub fn new(session: &'a dyn DocumentSession, page: usize) -> Self {
        Self {
            session,
            page,
            modes: HashMap::new(),
        }
    }

    /// Describe a font tag from the page resources, or `None` when the
    /// page has no such tag or its object cannot be read.
    pub fn describe(&self, tag: &str) -> Option<FontDescriptor> {
        let fonts = self.session.fonts(self.page).ok()?;
        let entry = fonts.iter().find(|f| f.tag == tag)?;
        if entry.xref == 0 {
            return None;
        }
        let obj = self.session.xref_object(entry.xref).ok()?;

        let is_cid = obj.contains("/Type0")
            || obj.contains("/CIDFont")
            || SUBTYPE_NAME
                .captures(&obj)
                .is_some_and(|c| &c[1] == "Type0");
        let encoding = ENCODING_NAME
            .captures(&obj)
            .or_else(|| BASE_ENCODING_NAME.captures(&obj))
            .map(|c| EncodingKind::from_name(&c[1]))
            .unwrap_or(EncodingKind::Unknown);
        let to_unicode_xref = TOUNICODE_REF
            .captures(&obj)
            .and_then(|c| c[1].parse::<u32>().ok());

        Some(FontDescriptor {
            tag: tag.to_string(),
            base_font: entry.base_font.clone(),
            encoding,
            is_cid,
            is_subset: entry.base_font.contains('+'),
            has_differences: obj.contains("/Differences"),
            to_unicode_xref,
        })
    }

    /// Resolve the editing mode for a font tag, caching the result.
    pub fn resolve(&mut self, tag: &str) -> FontMode {
        if let Some(mode) = self.modes.get(tag) {
            return mode.clone();
        }
        let mode = self.resolve_uncached(tag);
        self.modes.insert(tag.to_string(), mode.clone());
        mode
    }

    fn resolve_uncached(&self, tag: &str) -> FontMode {
        let Some(desc) = self.describe(tag) else {
            // Unknown tag or unreadable object: decode as Latin-1 and let
            // matching fail naturally rather than abort the stream.
            return FontMode::Direct(EncodingKind::Unknown);
        };

        if !desc.needs_cmap() {
            return FontMode::Direct(desc.encoding);
        }

        let Some(xref) = desc.to_unicode_xref else {
            log::debug!("font {tag}: no ToUnicode stream, skipping");
            return FontMode::Skip;
        };
        let Ok(stream) = self.session.xref_stream(xref) else {
            log::debug!("font {tag}: ToUnicode stream {xref} unreadable, skipping");
            return FontMode::Skip;
        };
        let cmap = ToUnicodeCMap::parse(&stream);
        if cmap.is_empty() || !cmap.has_reverse() {
            log::debug!("font {tag}: ToUnicode CMap empty or irreversible, skipping");
            return FontMode::Skip;
        }
        FontMode::Cmap(Arc::new(cmap))
    }
}
