//! Layout analysis: from the renderer's raw text tree to editable spans.

pub mod spans;

pub use spans::{extract, find, LogicalSpan, SpanFlags};
