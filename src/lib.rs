//! # pdf_redline
//!
//! Server-side PDF text-editing engine: replace the text of a visible
//! span on a page while preserving the original font, encoding, color,
//! and position as faithfully as possible.
//!
//! ## How an edit runs
//!
//! 1. **Logical-span extraction** ([`layout`]) turns the renderer's raw
//!    block/line/span tree into the user-visible units the UI targets —
//!    headings, paragraphs, bullet points — indexed in reading order.
//! 2. **Content-stream surgery** ([`content`], [`fonts`],
//!    [`editor::replace`]) tokenizes the page content stream, tracks
//!    font state, decodes string operands through the font's encoding or
//!    ToUnicode CMap, and re-encodes the replacement with the original
//!    character codes so the embedded font keeps rendering it.
//! 3. **Redact-and-reinsert** ([`editor::fallback`]) covers everything
//!    surgery cannot: multi-line spans, unsupported encodings, glyph
//!    coverage gaps, and style-changing edits.
//!
//! Document parsing, rasterisation, and redaction live behind the
//! [`render`] collaborator traits; an implementation wraps a real PDF
//! library. The [`engine::EditEngine`] façade ties store, history, and
//! editing together and serialises mutations per document.
//!
//! ## Quick start
//!
//! ```ignore
//! use pdf_redline::config::EngineConfig;
//! use pdf_redline::engine::EditEngine;
//! use pdf_redline::models::EditRequest;
//!
//! # fn run(backend: std::sync::Arc<dyn pdf_redline::render::RenderBackend>)
//! # -> pdf_redline::error::Result<()> {
//! let engine = EditEngine::new(EngineConfig::new("uploads"), backend)?;
//! let doc = engine.upload(&std::fs::read("report.pdf")?)?;
//! engine.edit_span(&doc.doc_id, 0, &EditRequest {
//!     span_index: 3,
//!     new_text: "Hello there".into(),
//!     font: None,
//!     size: None,
//!     color: None,
//! })?;
//! engine.undo(&doc.doc_id)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration and constants
pub mod config;

// Geometry
pub mod geometry;

// HTTP-facing models
pub mod models;

// Content-stream handling
pub mod content;

// Fonts: descriptors, CMaps, codecs
pub mod fonts;

// Layout analysis
pub mod layout;

// Renderer collaborator contract
pub mod render;

// Span editing
pub mod editor;

// Storage and history
pub mod history;
pub mod store;

// Image helpers
pub mod images;

// Engine façade
pub mod engine;

pub use engine::EditEngine;
pub use error::{Error, Result};
