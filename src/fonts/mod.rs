//! Font handling: descriptors, encodings, and string codecs.
//!
//! This module answers two questions for the replacement driver: how do
//! the bytes of a string operand map to visible text under a given page
//! font, and can a replacement string be expressed in that same font so
//! the edited page keeps its original embedded font program.

pub mod base14;
pub mod cmap;
pub mod codec;
pub mod embedded;
pub mod resolver;

pub use base14::normalize_font;
pub use cmap::ToUnicodeCMap;
pub use embedded::EmbeddedFont;
pub use resolver::{EncodingKind, FontDescriptor, FontMode, FontResolver};
