//! Emitter: DomTree → markup.
//!
//! Output is canonical: the same tree always produces the same bytes, and
//! re-parsing emitted markup emits it unchanged. History de-duplication
//! compares snapshots byte-for-byte, so nothing here may depend on hash
//! iteration order or generated ids.

use crate::model::*;
use crate::parser::{is_raw_text_element, is_void_element};
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Id of the overlay `<style>` the editor injects for hover/selection outlines.
/// It never belongs in a snapshot or export.
pub const EDITOR_STYLES_ID: &str = "editor-styles";

/// Emit a `DomTree` as a markup document.
#[must_use]
pub fn emit_document(tree: &DomTree) -> String {
    let mut out = String::with_capacity(4096);

    if let Some(doctype) = &tree.doctype {
        let _ = writeln!(out, "<!{doctype}>");
    }

    for child in tree.children(tree.root) {
        if emit_node(&mut out, tree, child, 0, true) {
            out.push('\n');
        }
    }

    out
}

/// Emit a single subtree (used for debugging and layer previews).
#[must_use]
pub fn emit_fragment(tree: &DomTree, idx: NodeIndex) -> String {
    let mut out = String::new();
    emit_node(&mut out, tree, idx, 0, false);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn is_editor_only(element: &Element) -> bool {
    element.attr("id") == Some(EDITOR_STYLES_ID)
}

/// Returns false when the node was skipped entirely.
fn emit_node(out: &mut String, tree: &DomTree, idx: NodeIndex, depth: usize, block: bool) -> bool {
    match &tree.graph[idx].kind {
        NodeKind::Document => false,
        NodeKind::Text(text) => {
            escape_text(out, text);
            true
        }
        NodeKind::Element(element) => {
            if is_editor_only(element) {
                return false;
            }
            if block {
                indent(out, depth);
            }
            emit_start_tag(out, element);
            if is_void_element(&element.tag) {
                return true;
            }

            let children = tree.children(idx);
            if is_raw_text_element(&element.tag) {
                out.push_str(&tree.text_content(idx));
            } else if children.iter().any(|&c| tree.graph[c].is_text()) {
                // Mixed content: emit inline so whitespace is not invented.
                for child in children {
                    emit_node(out, tree, child, depth + 1, false);
                }
            } else if !children.is_empty() {
                let mut wrote_any = false;
                for child in children {
                    let mut buf = String::new();
                    if emit_node(&mut buf, tree, child, depth + 1, true) {
                        out.push('\n');
                        out.push_str(&buf);
                        wrote_any = true;
                    }
                }
                if wrote_any {
                    out.push('\n');
                    indent(out, depth);
                }
            }

            let _ = write!(out, "</{}>", element.tag);
            true
        }
    }
}

fn emit_start_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        let _ = write!(out, " {name}=\"");
        escape_attr(out, value);
        out.push('"');
    }
    if !element.style.is_empty() {
        out.push_str(" style=\"");
        escape_attr(out, &element.style.to_css_text());
        out.push('"');
    }
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    #[test]
    fn emits_canonical_block_layout() {
        let tree = parse_document(
            r#"<!DOCTYPE html><html><body><div class="a" style="left:1px;top : 2px"><p>Hi &amp; bye</p><img src="x.png"></div></body></html>"#,
        )
        .unwrap();
        let expected = r#"<!DOCTYPE html>
<html>
  <body>
    <div class="a" style="left: 1px; top: 2px;">
      <p>Hi &amp; bye</p>
      <img src="x.png">
    </div>
  </body>
</html>
"#;
        assert_eq!(emit_document(&tree), expected);
    }

    #[test]
    fn emit_is_idempotent() {
        let source = r#"<html><head><style>
  .x { color: red }
</style></head><body><h1 id="t" title='say "hi"'>A <b>bold</b> move</h1><br/></body></html>"#;
        let once = emit_document(&parse_document(source).unwrap());
        let twice = emit_document(&parse_document(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn editor_styles_are_omitted() {
        let tree = parse_document(
            r#"<html><head><style id="editor-styles">.selected{outline:1px}</style></head><body></body></html>"#,
        )
        .unwrap();
        let out = emit_document(&tree);
        assert!(!out.contains("editor-styles"));
        assert!(out.contains("<head></head>"));
    }

    #[test]
    fn generated_ids_are_not_emitted() {
        let tree = parse_document("<div><span>x</span></div>").unwrap();
        assert_eq!(emit_document(&tree), "<div>\n  <span>x</span>\n</div>\n");
    }
}
