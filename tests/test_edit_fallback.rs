//! Redact-and-reinsert fallback tests.
//!
//! These drive `edit_span` at the editor level with scripted sessions
//! where surgery cannot apply, and assert the exact renderer call
//! sequence: redact before reinsert, grown and clamped rectangles, the
//! overflow retry, and the redact-only shape of span deletion.

mod common;

use common::{single_span_fixture, Event, ScriptedBackend};
use pdf_redline::config::{LINE_HEIGHT_FACTOR, PAGE_MARGIN, TEXT_WIDTH_PADDING};
use pdf_redline::editor::edit_span;
use pdf_redline::geometry::Rect;
use pdf_redline::models::EditRequest;

const HELVETICA_OBJ: &str =
    "<</Type/Font/Subtype/Type1/BaseFont/Helvetica/Encoding/WinAnsiEncoding>>";

fn text_edit(new_text: &str) -> EditRequest {
    EditRequest {
        span_index: 0,
        new_text: new_text.to_string(),
        font: None,
        size: None,
        color: None,
    }
}

#[test]
fn unencodable_text_falls_back_to_redact_and_reinsert() {
    let backend = ScriptedBackend::new(single_span_fixture(
        "cafe",
        b"BT /F1 12 Tf (cafe) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    // A replacement outside the font's code range refuses surgery and
    // redraws instead (no embedded font program is extractable here, so
    // the Base14 substitute draws it).
    edit_span(&mut session, &backend, 0, &text_edit("caf\u{0113} \u{20AC}")).unwrap();

    let events = backend.events();
    assert!(backend.updated_stream(10).is_none(), "no stream rewrite");

    let redact_at = events
        .iter()
        .position(|e| matches!(e, Event::Redact(0, _)))
        .expect("redacted");
    let apply_at = events
        .iter()
        .position(|e| matches!(e, Event::ApplyRedactions(0)))
        .expect("applied");
    let insert_at = events
        .iter()
        .position(|e| matches!(e, Event::InsertTextbox { .. }))
        .expect("reinserted");
    assert!(redact_at < apply_at && apply_at < insert_at);

    // Redaction covers exactly the span bbox.
    assert!(events.contains(&Event::Redact(0, Rect::new(72.0, 100.0, 300.0, 112.0))));

    // The substitute is Helvetica's Base14 identifier at the span's size.
    let Some(Event::InsertTextbox { font, size, .. }) = events.get(insert_at) else {
        panic!("expected textbox event");
    };
    assert_eq!(font, "helv");
    assert_eq!(*size, 12.0);

    assert!(events.contains(&Event::SaveIncremental));
}

#[test]
fn style_override_skips_surgery() {
    let backend = ScriptedBackend::new(single_span_fixture(
        "Hello world",
        b"BT /F1 12 Tf (Hello world) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    let req = EditRequest {
        span_index: 0,
        new_text: "Hello world".to_string(),
        font: None,
        size: Some(18.0),
        color: Some("#ff0000".to_string()),
    };
    edit_span(&mut session, &backend, 0, &req).unwrap();

    // Even though the stream operand matches, the style change forces
    // the redraw path.
    assert!(backend.updated_stream(10).is_none());
    let events = backend.events();
    assert!(events.iter().any(|e| matches!(e, Event::Redact(..))));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::InsertTextbox { size, .. } if *size == 18.0)));
}

#[test]
fn empty_replacement_redacts_without_reinserting() {
    let backend = ScriptedBackend::new(single_span_fixture(
        "Hello world",
        b"BT /F1 12 Tf (Hello world) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    edit_span(&mut session, &backend, 0, &text_edit("")).unwrap();

    let events = backend.events();
    assert!(events.iter().any(|e| matches!(e, Event::Redact(..))));
    assert!(events.iter().any(|e| matches!(e, Event::ApplyRedactions(0))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::InsertTextbox { .. } | Event::FillTextbox { .. })));
    assert!(events.contains(&Event::SaveIncremental));
}

#[test]
fn shallow_bbox_grows_to_line_height() {
    // Span bbox height 12pt; the reinsertion box must reach 15.6pt.
    let backend = ScriptedBackend::new(single_span_fixture(
        "x",
        b"BT /F1 12 Tf (x) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    edit_span(&mut session, &backend, 0, &text_edit("\u{20AC}")).unwrap();

    let events = backend.events();
    let Some(Event::InsertTextbox { rect, .. }) = events
        .iter()
        .find(|e| matches!(e, Event::InsertTextbox { .. }))
    else {
        panic!("expected textbox event");
    };
    let expected_height = 12.0 * LINE_HEIGHT_FACTOR;
    assert!((rect.height() - expected_height).abs() < 1e-4);
    assert_eq!(rect.y0, 100.0);
}

#[test]
fn wide_replacement_grows_width_and_clamps_to_page() {
    let backend = ScriptedBackend::new(single_span_fixture(
        "short",
        b"BT /F1 12 Tf (short) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    // 200 chars at 6pt each measure 1200pt, far past the 612pt page.
    let long: String = std::iter::repeat('\u{2013}').take(200).collect();
    edit_span(&mut session, &backend, 0, &text_edit(&long)).unwrap();

    let events = backend.events();
    let Some(Event::InsertTextbox { rect, .. }) = events
        .iter()
        .find(|e| matches!(e, Event::InsertTextbox { .. }))
    else {
        panic!("expected textbox event");
    };
    assert_eq!(rect.x1, 612.0 - PAGE_MARGIN);
    assert!(rect.x0 < rect.x1 && rect.y0 < rect.y1);
    assert!(rect.x0 >= 0.0 && rect.y1 <= 792.0);
}

#[test]
fn overflow_reported_by_renderer_triggers_one_retry() {
    let mut fixture = single_span_fixture(
        "Hello world",
        b"BT /F1 12 Tf (Hello world) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    );
    fixture.overflow_once = Some(2);
    let backend = ScriptedBackend::new(fixture);
    let mut session = backend.session();

    edit_span(&mut session, &backend, 0, &text_edit("\u{20AC} longer text")).unwrap();

    let boxes: Vec<Rect> = backend
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::InsertTextbox { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect();
    assert_eq!(boxes.len(), 2, "one placement, one retry");

    // Retry height covers the overflowed lines plus one.
    let expected = 12.0 * LINE_HEIGHT_FACTOR * 3.0;
    assert!((boxes[1].height() - expected).abs() < 1e-3);
}

#[test]
fn grown_width_includes_padding() {
    let backend = ScriptedBackend::new(single_span_fixture(
        "ab",
        b"BT /F1 12 Tf (ab) Tj ET",
        "Helvetica",
        HELVETICA_OBJ,
    ));
    let mut session = backend.session();

    // The scripted backend measures 6pt per char: 40 chars are 240pt,
    // just past the 228pt span bbox.
    let text: String = std::iter::repeat('\u{2014}').take(40).collect();
    edit_span(&mut session, &backend, 0, &text_edit(&text)).unwrap();

    let events = backend.events();
    let Some(Event::InsertTextbox { rect, .. }) = events
        .iter()
        .find(|e| matches!(e, Event::InsertTextbox { .. }))
    else {
        panic!("expected textbox event");
    };
    assert!((rect.x1 - (72.0 + 240.0 + TEXT_WIDTH_PADDING)).abs() < 1e-3);
}
