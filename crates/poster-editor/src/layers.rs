//! Layer list over the poster's top-level elements.
//!
//! Layers are the element children of `.poster-container` (or `body` when
//! the document has no container), minus non-visual tags. Ordering
//! operations write `z-index` directly.

use crate::mutate;
use poster_core::host::DocumentHost;
use poster_core::id::NodeId;
use poster_core::style::PositionMode;
use serde::Serialize;

/// Class marking the poster's root element.
pub const CONTAINER_CLASS: &str = "poster-container";

const SKIPPED_TAGS: &[&str] = &["script", "style", "link", "meta", "noscript"];

/// Characters of text shown in a layer name.
const NAME_TEXT_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerItem {
    pub id: NodeId,
    pub name: String,
    pub z_index: i32,
    pub visible: bool,
}

/// The element whose children are layers.
pub fn layer_container<H: DocumentHost>(host: &H) -> Option<NodeId> {
    host.find_by_class(CONTAINER_CLASS).or_else(|| host.body())
}

/// Human-readable name: `#id`, `.first-class`, `tag: "text"`, or the tag.
pub fn element_name<H: DocumentHost>(host: &H, id: NodeId) -> String {
    if let Some(attr) = host.attribute(id, "id").filter(|v| !v.is_empty()) {
        return format!("#{attr}");
    }
    if let Some(class) = host
        .attribute(id, "class")
        .and_then(|c| c.split(' ').next().map(str::to_string))
        .filter(|c| !c.is_empty())
    {
        return format!(".{class}");
    }

    let tag = host.tag_name(id).unwrap_or_default();
    let text = host.text_content(id).unwrap_or_default();
    let preview: String = text.trim().chars().take(NAME_TEXT_LEN).collect();
    if preview.is_empty() {
        return tag;
    }
    let ellipsis = if preview.chars().count() >= NAME_TEXT_LEN { "..." } else { "" };
    format!("{tag}: \"{preview}{ellipsis}\"")
}

/// Current layers, bottom of the document first.
pub fn layers<H: DocumentHost>(host: &H) -> Vec<LayerItem> {
    let Some(container) = layer_container(host) else {
        return Vec::new();
    };
    host.children(container)
        .into_iter()
        .filter(|&id| {
            host.tag_name(id)
                .is_some_and(|tag| !SKIPPED_TAGS.contains(&tag.as_str()))
        })
        .enumerate()
        .map(|(index, id)| {
            let style = host.computed_style(id).unwrap_or_default();
            let z = style.z_index();
            LayerItem {
                id,
                name: element_name(host, id),
                z_index: if z == 0 { index as i32 } else { z },
                visible: !style.is_hidden(),
            }
        })
        .collect()
}

fn resolved_z<H: DocumentHost>(host: &H, id: NodeId) -> Option<i32> {
    host.computed_style(id).map(|s| s.z_index())
}

fn write_z<H: DocumentHost>(host: &mut H, id: NodeId, z: i32) -> bool {
    mutate::ensure_positioned(host, id, PositionMode::Relative);
    host.set_inline_style(id, "z-index", &z.to_string())
}

pub fn move_layer_up<H: DocumentHost>(host: &mut H, id: NodeId) -> bool {
    match resolved_z(host, id) {
        Some(z) => write_z(host, id, z.saturating_add(1)),
        None => false,
    }
}

/// One step down, never below zero.
pub fn move_layer_down<H: DocumentHost>(host: &mut H, id: NodeId) -> bool {
    match resolved_z(host, id) {
        Some(z) => write_z(host, id, z.saturating_sub(1).max(0)),
        None => false,
    }
}

/// Toggle inline `display: none`.
pub fn toggle_visibility<H: DocumentHost>(host: &mut H, id: NodeId) -> bool {
    let hidden = host.inline_style(id, "display").as_deref() == Some("none");
    host.set_inline_style(id, "display", if hidden { "" } else { "none" })
}

/// Assign stacking values from a top-first ordering: the first id gets
/// `len`, the last gets 1.
pub fn reorder_layers<H: DocumentHost>(host: &mut H, top_first: &[NodeId]) -> bool {
    let len = top_first.len() as i32;
    let mut changed = false;
    for (i, &id) in top_first.iter().enumerate() {
        changed |= write_z(host, id, len - i as i32);
    }
    changed
}

pub fn delete_layer<H: DocumentHost>(host: &mut H, id: NodeId) -> bool {
    mutate::delete(host, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_core::document::PosterDocument;
    use poster_core::layout::Viewport;
    use pretty_assertions::assert_eq;

    const SRC: &str = r#"<html><head><style>.poster-container { position: relative }</style></head><body>
      <div class="poster-container">
        <style>.x { color: red }</style>
        <h1 id="title" style="position: absolute; z-index: 5">Sale</h1>
        <div class="badge round">-40%</div>
        <p>An offer you really cannot refuse today</p>
        <p>Short</p>
        <section></section>
      </div>
    </body></html>"#;

    fn doc() -> PosterDocument {
        PosterDocument::from_markup(SRC, Viewport::default()).unwrap()
    }

    #[test]
    fn names_and_z_values() {
        let doc = doc();
        let items = layers(&doc);
        let names: Vec<&str> = items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "#title",
                ".badge",
                "p: \"An offer you really ...\"",
                "p: \"Short\"",
                "section",
            ]
        );
        let z: Vec<i32> = items.iter().map(|l| l.z_index).collect();
        assert_eq!(z, vec![5, 1, 2, 3, 4]);
        assert!(items.iter().all(|l| l.visible));
    }

    #[test]
    fn up_and_down() {
        let mut doc = doc();
        let title = NodeId::intern("title");
        assert!(move_layer_up(&mut doc, title));
        assert_eq!(resolved_z(&doc, title), Some(6));

        let badge = layers(&doc)[1].id;
        assert!(move_layer_down(&mut doc, badge));
        assert_eq!(resolved_z(&doc, badge), Some(0));
        assert_eq!(
            doc.computed_style(badge).unwrap().position(),
            PositionMode::Relative
        );
    }

    #[test]
    fn visibility_round_trip() {
        let mut doc = doc();
        let title = NodeId::intern("title");
        toggle_visibility(&mut doc, title);
        assert!(!layers(&doc)[0].visible);
        toggle_visibility(&mut doc, title);
        assert!(layers(&doc)[0].visible);
        assert_eq!(doc.inline_style(title, "display"), None);
    }

    #[test]
    fn reorder_assigns_descending_values() {
        let mut doc = doc();
        let ids: Vec<NodeId> = layers(&doc).iter().rev().map(|l| l.id).collect();
        reorder_layers(&mut doc, &ids);
        let z: Vec<i32> = ids.iter().map(|&id| resolved_z(&doc, id).unwrap()).collect();
        assert_eq!(z, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn up_saturates_at_the_top_value() {
        let mut doc = PosterDocument::from_markup(
            r#"<body><div class="poster-container"><div id="overlay" style="position: fixed; z-index: 2147483647"></div></div></body>"#,
            Viewport::default(),
        )
        .unwrap();
        let overlay = NodeId::intern("overlay");
        assert!(move_layer_up(&mut doc, overlay));
        assert_eq!(resolved_z(&doc, overlay), Some(i32::MAX));
    }

    #[test]
    fn falls_back_to_body() {
        let doc = PosterDocument::from_markup(
            r#"<html><body><div id="only">x</div></body></html>"#,
            Viewport::default(),
        )
        .unwrap();
        let items = layers(&doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "#only");
    }
}
