//! Error types for the editing engine.
//!
//! This module defines all error types that can occur while storing,
//! inspecting, or editing documents. The HTTP collaborator maps them to
//! status codes: `InvalidId`, `Oversize`, `InvalidPdf`, `InvalidImage` and
//! `InvalidRequest` surface as 400, `NotFound` as 404, `EditFailed` as 500.
//! `EncodeImpossible` is internal: it only tells the edit orchestrator that
//! content-stream surgery cannot represent the replacement text and the
//! redact-and-reinsert fallback must take over.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing edit requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Document identifier is not exactly 16 lowercase hex characters
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    /// Document file, page, span, or image does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upload exceeds the configured size limit
    #[error("File too large ({size} bytes, max {limit})")]
    Oversize {
        /// Size of the rejected payload in bytes
        size: usize,
        /// Configured maximum in bytes
        limit: usize,
    },

    /// The renderer could not parse the PDF payload
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// The image payload could not be parsed
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A request field failed validation (e.g. a malformed hex color)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Replacement text contains a character the font's encoding cannot
    /// represent. Never surfaced to callers of the engine.
    #[error("Cannot encode {0:?} for the target font")]
    EncodeImpossible(char),

    /// Both content-stream surgery and the fallback path failed
    #[error("Edit failed: {0}")]
    EditFailed(String),

    /// Failure reported by the renderer collaborator
    #[error("Render error: {0}")]
    Render(String),

    /// IO error from the document store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
