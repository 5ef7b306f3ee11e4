//! The editing engine: every public operation of the service.
//!
//! `EditEngine` owns the document store, the undo/redo history, and the
//! renderer backend, and serialises all access to one document behind a
//! per-document lock — the renderer is not re-entrant for a given file,
//! and the snapshot-then-mutate discipline only holds when mutations
//! cannot interleave.
//!
//! Every mutating operation follows the same shape: validate the id,
//! take the document lock, snapshot, mutate through an open session,
//! persist. A failure after the snapshot leaves the file bytes at their
//! pre-snapshot state because nothing was written yet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{EngineConfig, IMAGE_PADDING, PAGE_MARGIN, TEXT_BOX_HEIGHT_FACTOR};
use crate::editor;
use crate::error::{Error, Result};
use crate::fonts::base14::normalize_font;
use crate::geometry::Rect;
use crate::history::HistoryStore;
use crate::images;
use crate::layout;
use crate::models::{
    hex_to_rgb, int_to_hex_color, AddTextRequest, EditRequest, PageImages, PageText, TextSpan,
    UploadResponse,
};
use crate::render::{DocumentSession, RenderBackend};
use crate::store::{validate_doc_id, DocumentStore};

/// Server-side PDF text-editing engine.
pub struct EditEngine {
    config: EngineConfig,
    store: DocumentStore,
    history: HistoryStore,
    backend: Arc<dyn RenderBackend>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EditEngine {
    /// Create an engine over a renderer backend.
    pub fn new(config: EngineConfig, backend: Arc<dyn RenderBackend>) -> Result<Self> {
        let store = DocumentStore::new(&config.upload_dir, config.max_upload_size)?;
        let history = HistoryStore::new(config.max_undo);
        Ok(Self {
            config,
            store,
            history,
            backend,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// The per-document mutation lock.
    fn doc_lock(&self, doc_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        Arc::clone(locks.entry(doc_id.to_string()).or_default())
    }

    /// Open a session over a stored document.
    fn open(&self, doc_id: &str) -> Result<Box<dyn DocumentSession>> {
        let path = self.store.existing_path(doc_id)?;
        self.backend.open(&path)
    }

    fn check_page(session: &dyn DocumentSession, page: usize) -> Result<()> {
        if page >= session.page_count() {
            return Err(Error::NotFound(format!("Page {page} out of range")));
        }
        Ok(())
    }

    /// Validate and store an uploaded PDF.
    pub fn upload(&self, content: &[u8]) -> Result<UploadResponse> {
        if content.is_empty() {
            return Err(Error::InvalidPdf("empty file".to_string()));
        }
        if content.len() > self.config.max_upload_size {
            return Err(Error::Oversize {
                size: content.len(),
                limit: self.config.max_upload_size,
            });
        }
        let page_count = self
            .backend
            .probe(content)
            .map_err(|e| Error::InvalidPdf(e.to_string()))?;
        let doc_id = self.store.save_upload(content)?;
        log::debug!("uploaded {doc_id}: {page_count} pages");
        Ok(UploadResponse { doc_id, page_count })
    }

    /// Raw file bytes for download.
    pub fn pdf_bytes(&self, doc_id: &str) -> Result<Vec<u8>> {
        self.store.read(doc_id)
    }

    /// Render one page to PNG at the configured scale.
    pub fn render_page(&self, doc_id: &str, page: usize) -> Result<Vec<u8>> {
        let session = self.open(doc_id)?;
        Self::check_page(&*session, page)?;
        session.render_png(page, self.config.render_scale)
    }

    /// Logical spans of one page, with page geometry.
    pub fn page_text(&self, doc_id: &str, page: usize) -> Result<PageText> {
        let session = self.open(doc_id)?;
        Self::check_page(&*session, page)?;
        let rect = session.page_rect(page)?;
        let blocks = session.text_blocks(page)?;

        let spans = layout::extract(&blocks)
            .into_iter()
            .map(|span| TextSpan {
                index: span.index,
                text: span.text,
                bbox: span.bbox.to_array(),
                normalized_font: normalize_font(&span.font),
                font: span.font,
                size: (span.size * 100.0).round() / 100.0,
                color: int_to_hex_color(span.color),
                flags: span.flags,
            })
            .collect();

        Ok(PageText {
            page_num: page,
            width: rect.width(),
            height: rect.height(),
            spans,
        })
    }

    /// Replace the text of a logical span, preserving the original font
    /// when the content stream permits it.
    pub fn edit_span(&self, doc_id: &str, page: usize, req: &EditRequest) -> Result<()> {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");

        let path = self.store.existing_path(doc_id)?;
        self.history.snapshot_before(doc_id, &path)?;

        let mut session = self.backend.open(&path)?;
        Self::check_page(&*session, page)?;
        editor::edit_span(&mut *session, &*self.backend, page, req)
    }

    /// Add new text at a position with a Base14 font.
    pub fn add_text(&self, doc_id: &str, page: usize, req: &AddTextRequest) -> Result<()> {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");

        let path = self.store.existing_path(doc_id)?;
        self.history.snapshot_before(doc_id, &path)?;

        let mut session = self.backend.open(&path)?;
        Self::check_page(&*session, page)?;
        let page_rect = session.page_rect(page)?;

        let font = normalize_font(&req.font);
        let color = hex_to_rgb(&req.color)?;
        let width = self.backend.text_width(&req.text, &font, req.size);
        let rect = Rect {
            x0: req.x,
            y0: req.y,
            x1: (req.x + width + IMAGE_PADDING).min(page_rect.x1 - PAGE_MARGIN),
            y1: req.y + req.size * TEXT_BOX_HEIGHT_FACTOR,
        };
        session.insert_textbox(page, rect, &req.text, &font, req.size, color)?;
        session.save_incremental()
    }

    /// Image placements of one page, with page geometry.
    pub fn page_images(&self, doc_id: &str, page: usize) -> Result<PageImages> {
        let session = self.open(doc_id)?;
        Self::check_page(&*session, page)?;
        let rect = session.page_rect(page)?;
        Ok(PageImages {
            page_num: page,
            width: rect.width(),
            height: rect.height(),
            images: images::list_images(&*session, page)?,
        })
    }

    /// Insert an image at a position.
    pub fn add_image(
        &self,
        doc_id: &str,
        page: usize,
        x: f32,
        y: f32,
        image: &[u8],
        width: f32,
        height: f32,
    ) -> Result<()> {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");

        let path = self.store.existing_path(doc_id)?;
        self.history.snapshot_before(doc_id, &path)?;

        let mut session = self.backend.open(&path)?;
        Self::check_page(&*session, page)?;
        images::add_image(&mut *session, page, x, y, image, width, height)?;
        session.save_incremental()
    }

    /// Delete an image placement.
    pub fn delete_image(&self, doc_id: &str, page: usize, image_index: usize) -> Result<()> {
        self.mutate_image(doc_id, page, |session| {
            images::delete_image(session, page, image_index)
        })
    }

    /// Move an image placement, preserving its dimensions.
    pub fn move_image(
        &self,
        doc_id: &str,
        page: usize,
        image_index: usize,
        new_x: f32,
        new_y: f32,
    ) -> Result<()> {
        self.mutate_image(doc_id, page, |session| {
            images::move_image(session, page, image_index, new_x, new_y)
        })
    }

    /// Resize and reposition an image placement.
    pub fn resize_image(
        &self,
        doc_id: &str,
        page: usize,
        image_index: usize,
        new_x: f32,
        new_y: f32,
        new_w: f32,
        new_h: f32,
    ) -> Result<()> {
        self.mutate_image(doc_id, page, |session| {
            images::resize_image(session, page, image_index, new_x, new_y, new_w, new_h)
        })
    }

    /// Shared shape of the image mutations that must persist through the
    /// compacting save: deletion leaves placeholder objects behind that
    /// an incremental save would keep forever.
    fn mutate_image<F>(&self, doc_id: &str, page: usize, op: F) -> Result<()>
    where
        F: FnOnce(&mut dyn DocumentSession) -> Result<()>,
    {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");

        let path = self.store.existing_path(doc_id)?;
        self.history.snapshot_before(doc_id, &path)?;

        let mut session = self.backend.open(&path)?;
        Self::check_page(&*session, page)?;
        op(&mut *session)?;
        let bytes = session.save_compacted()?;
        self.store.write(doc_id, &bytes)
    }

    /// Restore the previous snapshot of a document.
    pub fn undo(&self, doc_id: &str) -> Result<bool> {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");
        let path = self.store.existing_path(doc_id)?;
        self.history.undo(doc_id, &path)
    }

    /// Re-apply the last undone mutation of a document.
    pub fn redo(&self, doc_id: &str) -> Result<bool> {
        validate_doc_id(doc_id)?;
        let lock = self.doc_lock(doc_id);
        let _guard = lock.lock().expect("document lock poisoned");
        let path = self.store.existing_path(doc_id)?;
        self.history.redo(doc_id, &path)
    }
}
