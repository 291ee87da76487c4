//! Integration tests: parse → emit → re-parse round-trip.
//!
//! Snapshots are compared byte-for-byte by the history, so emitting a
//! re-parsed snapshot must reproduce it exactly.

use poster_core::document::PosterDocument;
use poster_core::emitter::emit_document;
use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::layout::Viewport;
use poster_core::parser::parse_document;
use pretty_assertions::assert_eq;

const POSTER: &str = include_str!("fixtures/poster.html");

// ─── Helpers ─────────────────────────────────────────────────────────────

fn authored_ids(markup: &str) -> Vec<String> {
    let tree = parse_document(markup).expect("parse failed");
    let mut ids: Vec<String> = tree
        .id_index
        .keys()
        .filter(|id| !id.is_generated() && **id != NodeId::document())
        .map(|id| id.as_str().to_string())
        .collect();
    ids.sort();
    ids
}

// ─── Fixture-based tests ─────────────────────────────────────────────────

#[test]
fn emitted_fixture_is_stable() {
    let first = emit_document(&parse_document(POSTER).unwrap());
    let second = emit_document(&parse_document(&first).unwrap());
    assert_eq!(first, second);
}

#[test]
fn authored_ids_survive_roundtrip() {
    let emitted = emit_document(&parse_document(POSTER).unwrap());
    assert_eq!(authored_ids(POSTER), authored_ids(&emitted));
    assert_eq!(
        authored_ids(POSTER),
        vec!["badge", "discount", "footer", "headline", "hero", "logo"]
    );
}

#[test]
fn stylesheet_and_entities_survive_roundtrip() {
    let emitted = emit_document(&parse_document(POSTER).unwrap());
    assert!(emitted.starts_with("<!DOCTYPE html>\n"));
    assert!(emitted.contains(".badge { position: absolute;"));
    assert!(emitted.contains("while stocks last &amp; more"));
}

#[test]
fn style_edits_are_serialized() {
    let mut doc = PosterDocument::from_markup(POSTER, Viewport::default()).unwrap();
    let footer = NodeId::intern("footer");
    doc.set_inline_style(footer, "opacity", "0.5");
    let out = doc.serialize();
    assert!(out.contains(r#"<p id="footer" style="opacity: 0.5;">"#), "{out}");
}

#[test]
fn editor_overlay_is_never_serialized() {
    let src = r#"<html><head><style id="editor-styles">.selected { outline: 2px solid blue }</style></head><body><div id="a">a</div></body></html>"#;
    let out = emit_document(&parse_document(src).unwrap());
    assert!(!out.contains("editor-styles"));
    assert!(!out.contains("outline"));
    assert!(out.contains(r#"<div id="a">a</div>"#));
}
