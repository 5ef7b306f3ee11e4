//! Scripted in-memory renderer for integration tests.
//!
//! `ScriptedBackend` implements the renderer contract over fixture data:
//! pages carry a raw text tree, a font list, and content streams keyed by
//! xref. Every mutating call is recorded as an [`Event`] so tests can
//! assert on the exact sequence the engine drove, and stream updates are
//! mirrored into a shared map for inspection after the engine returns.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pdf_redline::error::{Error, Result};
use pdf_redline::geometry::{Point, Rect};
use pdf_redline::render::{
    BlockKind, Color, DocumentSession, ExtractedFontFile, PageFont, PlacedImage, RawBlock,
    RawLine, RawSpan, RenderBackend, TextboxFit,
};

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CleanContents(usize),
    UpdateStream(u32, Vec<u8>),
    Redact(usize, Rect),
    ApplyRedactions(usize),
    InsertTextbox {
        page: usize,
        rect: Rect,
        text: String,
        font: String,
        size: f32,
    },
    PlaceText {
        page: usize,
        origin: Point,
        text: String,
        size: f32,
    },
    FillTextbox {
        page: usize,
        rect: Rect,
        text: String,
        size: f32,
    },
    InsertImage {
        page: usize,
        rect: Rect,
    },
    DeleteImage {
        page: usize,
        xref: u32,
    },
    SaveIncremental,
    SaveCompacted,
}

/// Fixture for one page.
#[derive(Debug, Clone)]
pub struct PageFixture {
    pub rect: Rect,
    pub blocks: Vec<RawBlock>,
    pub fonts: Vec<PageFont>,
    pub content_xref: u32,
    pub images: Vec<PlacedImage>,
}

impl Default for PageFixture {
    fn default() -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 612.0, 792.0),
            blocks: Vec::new(),
            fonts: Vec::new(),
            content_xref: 0,
            images: Vec::new(),
        }
    }
}

/// Fixture for one document.
#[derive(Debug, Clone, Default)]
pub struct DocFixture {
    pub pages: Vec<PageFixture>,
    pub streams: HashMap<u32, Vec<u8>>,
    pub objects: HashMap<u32, String>,
    pub font_files: HashMap<u32, ExtractedFontFile>,
    pub image_bytes: HashMap<u32, Vec<u8>>,
    /// When set, the next textbox placement reports this many overflowed
    /// lines before fitting.
    pub overflow_once: Option<u32>,
}

/// Renderer backend over a document fixture.
pub struct ScriptedBackend {
    fixture: DocFixture,
    pub events: Arc<Mutex<Vec<Event>>>,
    pub updated_streams: Arc<Mutex<HashMap<u32, Vec<u8>>>>,
}

impl ScriptedBackend {
    pub fn new(fixture: DocFixture) -> Self {
        Self {
            fixture,
            events: Arc::new(Mutex::new(Vec::new())),
            updated_streams: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn updated_stream(&self, xref: u32) -> Option<Vec<u8>> {
        self.updated_streams.lock().unwrap().get(&xref).cloned()
    }

    /// Open a session directly over the fixture, without a backing file.
    pub fn session(&self) -> ScriptedSession {
        ScriptedSession {
            fixture: self.fixture.clone(),
            path: None,
            events: Arc::clone(&self.events),
            updated_streams: Arc::clone(&self.updated_streams),
        }
    }
}

impl RenderBackend for ScriptedBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentSession>> {
        if !path.exists() {
            return Err(Error::Render(format!("missing file {}", path.display())));
        }
        Ok(Box::new(ScriptedSession {
            fixture: self.fixture.clone(),
            path: Some(path.to_path_buf()),
            events: Arc::clone(&self.events),
            updated_streams: Arc::clone(&self.updated_streams),
        }))
    }

    fn probe(&self, bytes: &[u8]) -> Result<usize> {
        if bytes.starts_with(b"%PDF") {
            Ok(self.fixture.pages.len())
        } else {
            Err(Error::Render("no PDF header".to_string()))
        }
    }

    fn text_width(&self, text: &str, _font_name: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.5
    }
}

/// One scripted open document.
pub struct ScriptedSession {
    fixture: DocFixture,
    path: Option<PathBuf>,
    events: Arc<Mutex<Vec<Event>>>,
    updated_streams: Arc<Mutex<HashMap<u32, Vec<u8>>>>,
}

impl ScriptedSession {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn page(&self, page: usize) -> Result<&PageFixture> {
        self.fixture
            .pages
            .get(page)
            .ok_or_else(|| Error::NotFound(format!("Page {page} out of range")))
    }

    fn next_fit(&mut self) -> TextboxFit {
        match self.fixture.overflow_once.take() {
            Some(lines) => TextboxFit::Overflow { lines },
            None => TextboxFit::Fit,
        }
    }
}

impl DocumentSession for ScriptedSession {
    fn page_count(&self) -> usize {
        self.fixture.pages.len()
    }

    fn page_rect(&self, page: usize) -> Result<Rect> {
        Ok(self.page(page)?.rect)
    }

    fn text_blocks(&self, page: usize) -> Result<Vec<RawBlock>> {
        Ok(self.page(page)?.blocks.clone())
    }

    fn fonts(&self, page: usize) -> Result<Vec<PageFont>> {
        Ok(self.page(page)?.fonts.clone())
    }

    fn xref_object(&self, xref: u32) -> Result<String> {
        self.fixture
            .objects
            .get(&xref)
            .cloned()
            .ok_or_else(|| Error::Render(format!("no object {xref}")))
    }

    fn xref_stream(&self, xref: u32) -> Result<Vec<u8>> {
        self.fixture
            .streams
            .get(&xref)
            .cloned()
            .ok_or_else(|| Error::Render(format!("no stream {xref}")))
    }

    fn update_stream(&mut self, xref: u32, data: &[u8]) -> Result<()> {
        self.fixture.streams.insert(xref, data.to_vec());
        self.updated_streams
            .lock()
            .unwrap()
            .insert(xref, data.to_vec());
        self.record(Event::UpdateStream(xref, data.to_vec()));
        Ok(())
    }

    fn clean_contents(&mut self, page: usize) -> Result<()> {
        self.page(page)?;
        self.record(Event::CleanContents(page));
        Ok(())
    }

    fn content_xrefs(&self, page: usize) -> Result<Vec<u32>> {
        let xref = self.page(page)?.content_xref;
        Ok(if xref == 0 { Vec::new() } else { vec![xref] })
    }

    fn extract_font(&self, xref: u32) -> Result<ExtractedFontFile> {
        self.fixture
            .font_files
            .get(&xref)
            .cloned()
            .ok_or_else(|| Error::Render(format!("font {xref} not extractable")))
    }

    fn add_redact_annot(&mut self, page: usize, rect: Rect) -> Result<()> {
        self.page(page)?;
        self.record(Event::Redact(page, rect));
        Ok(())
    }

    fn apply_redactions_keep_images(&mut self, page: usize) -> Result<()> {
        self.page(page)?;
        self.record(Event::ApplyRedactions(page));
        Ok(())
    }

    fn insert_textbox(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        font_name: &str,
        size: f32,
        _color: Color,
    ) -> Result<TextboxFit> {
        self.page(page)?;
        self.record(Event::InsertTextbox {
            page,
            rect,
            text: text.to_string(),
            font: font_name.to_string(),
            size,
        });
        Ok(self.next_fit())
    }

    fn place_text(
        &mut self,
        page: usize,
        origin: Point,
        text: &str,
        _font_data: &[u8],
        size: f32,
        _color: Color,
    ) -> Result<()> {
        self.page(page)?;
        self.record(Event::PlaceText {
            page,
            origin,
            text: text.to_string(),
            size,
        });
        Ok(())
    }

    fn fill_textbox(
        &mut self,
        page: usize,
        rect: Rect,
        text: &str,
        _font_data: &[u8],
        size: f32,
        _color: Color,
    ) -> Result<TextboxFit> {
        self.page(page)?;
        self.record(Event::FillTextbox {
            page,
            rect,
            text: text.to_string(),
            size,
        });
        Ok(self.next_fit())
    }

    fn insert_image(&mut self, page: usize, rect: Rect, _image: &[u8]) -> Result<()> {
        self.page(page)?;
        self.record(Event::InsertImage { page, rect });
        Ok(())
    }

    fn delete_image(&mut self, page: usize, xref: u32) -> Result<()> {
        self.page(page)?;
        self.record(Event::DeleteImage { page, xref });
        Ok(())
    }

    fn images(&self, page: usize) -> Result<Vec<PlacedImage>> {
        Ok(self.page(page)?.images.clone())
    }

    fn extract_image(&self, xref: u32) -> Result<Vec<u8>> {
        self.fixture
            .image_bytes
            .get(&xref)
            .cloned()
            .ok_or_else(|| Error::Render(format!("no image {xref}")))
    }

    fn image_size(&self, image: &[u8]) -> Result<(f32, f32)> {
        if image.is_empty() {
            return Err(Error::Render("empty image payload".to_string()));
        }
        Ok((100.0, 50.0))
    }

    fn render_png(&self, page: usize, _scale: f32) -> Result<Vec<u8>> {
        self.page(page)?;
        let mut png = b"\x89PNG fake ".to_vec();
        png.push(page as u8);
        Ok(png)
    }

    fn save_incremental(&mut self) -> Result<()> {
        self.record(Event::SaveIncremental);
        if let Some(path) = &self.path {
            let mut bytes = fs::read(path)?;
            bytes.extend_from_slice(b"\n% incremental update");
            fs::write(path, bytes)?;
        }
        Ok(())
    }

    fn save_compacted(&mut self) -> Result<Vec<u8>> {
        self.record(Event::SaveCompacted);
        let mut bytes = match &self.path {
            Some(path) => fs::read(path)?,
            None => b"%PDF-1.7".to_vec(),
        };
        bytes.extend_from_slice(b"\n% compacted");
        Ok(bytes)
    }
}

/// A one-span raw text block.
pub fn line_block(text: &str, bbox: Rect, font: &str, size: f32) -> RawBlock {
    RawBlock {
        kind: BlockKind::Text,
        bbox,
        lines: vec![RawLine {
            bbox,
            spans: vec![RawSpan {
                text: text.to_string(),
                bbox,
                font: font.to_string(),
                size,
                color: 0,
                flags: 0,
            }],
        }],
    }
}

/// A page-font entry.
pub fn page_font(xref: u32, base_font: &str, tag: &str, encoding: Option<&str>) -> PageFont {
    PageFont {
        xref,
        ext: "ttf".to_string(),
        subtype: "Type1".to_string(),
        base_font: base_font.to_string(),
        tag: tag.to_string(),
        encoding: encoding.map(str::to_string),
    }
}

/// One page whose only text is `text`, drawn by `stream` under font tag
/// `F1` described by `font_object`.
pub fn single_span_fixture(text: &str, stream: &[u8], base_font: &str, font_object: &str) -> DocFixture {
    let bbox = Rect::new(72.0, 100.0, 300.0, 112.0);
    let page = PageFixture {
        blocks: vec![line_block(text, bbox, base_font, 12.0)],
        fonts: vec![page_font(5, base_font, "F1", None)],
        content_xref: 10,
        ..Default::default()
    };
    let mut fixture = DocFixture {
        pages: vec![page],
        ..Default::default()
    };
    fixture.streams.insert(10, stream.to_vec());
    fixture.objects.insert(5, font_object.to_string());
    fixture
}
