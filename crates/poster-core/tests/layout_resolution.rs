//! Integration tests: parse → cascade → layout → hit test.
//!
//! Exercises the full `poster-core` pipeline through the document host.

use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::layout::Viewport;
use poster_core::model::Bounds;
use poster_core::document::PosterDocument;
use pretty_assertions::assert_eq;

fn load() -> PosterDocument {
    let _ = env_logger::builder().is_test(true).try_init();
    PosterDocument::from_markup(include_str!("fixtures/poster.html"), Viewport::default()).unwrap()
}

fn bounds(doc: &PosterDocument, name: &str) -> Bounds {
    doc.bounds(NodeId::intern(name))
        .unwrap_or_else(|| panic!("no bounds for #{name}"))
}

// ─── Positioning ────────────────────────────────────────────────────────

#[test]
fn stylesheet_positions_absolute_elements() {
    let doc = load();
    let badge = bounds(&doc, "badge");
    assert_eq!(badge, Bounds::new(760.0, 640.0, 240.0, 240.0));

    let headline = bounds(&doc, "headline");
    assert_eq!((headline.x, headline.y, headline.width), (80.0, 120.0, 920.0));
}

#[test]
fn inline_geometry_and_image_attributes() {
    let doc = load();
    assert_eq!(bounds(&doc, "hero"), Bounds::new(0.0, 360.0, 1080.0, 540.0));
    assert_eq!(bounds(&doc, "logo"), Bounds::new(40.0, 960.0, 120.0, 60.0));
}

#[test]
fn static_children_flow_inside_positioned_parent() {
    let doc = load();
    let discount = bounds(&doc, "discount");
    assert_eq!((discount.x, discount.y), (760.0, 640.0));

    // Absolute siblings do not push the footer down.
    assert_eq!(bounds(&doc, "footer").y, 0.0);
}

// ─── Cascade ────────────────────────────────────────────────────────────

#[test]
fn computed_style_merges_sheet_and_inline() {
    let doc = load();
    let headline = doc.computed_style(NodeId::intern("headline")).unwrap();
    assert_eq!(headline.get("position"), "absolute");
    assert_eq!(headline.z_index(), 2);
    assert_eq!(headline.get("font-size"), "96px");

    let hero = doc.computed_style(NodeId::intern("hero")).unwrap();
    assert!(hero.has_background_image());
    assert_eq!(hero.z_index(), 1);

    let footer = doc.computed_style(NodeId::intern("footer")).unwrap();
    assert_eq!(footer.get("position"), "static");
}

// ─── Hit testing ────────────────────────────────────────────────────────

#[test]
fn hit_test_prefers_higher_stacking_value() {
    let doc = load();
    assert_eq!(doc.hit_test(100.0, 150.0), Some(NodeId::intern("headline")));
    assert_eq!(doc.hit_test(500.0, 500.0), Some(NodeId::intern("hero")));
    // The badge (z 3) overlaps the hero (z 1); its span is deepest.
    assert_eq!(doc.hit_test(800.0, 660.0), Some(NodeId::intern("discount")));
    assert_eq!(doc.hit_test(800.0, 850.0), Some(NodeId::intern("badge")));
}

#[test]
fn empty_canvas_area_hits_the_container() {
    let doc = load();
    let container = doc.find_by_class("poster-container").unwrap();
    assert_eq!(doc.hit_test(500.0, 1000.0), Some(container));
}

#[test]
fn points_outside_the_canvas_hit_nothing() {
    let doc = load();
    assert_eq!(doc.hit_test(2000.0, 2000.0), None);
}
