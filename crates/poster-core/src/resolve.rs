//! Style resolution across the tree.
//!
//! Runs the cascade top-down so inherited properties see their parent's
//! computed values.

use crate::model::DomTree;
use crate::style::{ComputedStyle, Stylesheet};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Computed styles for every attached element.
pub fn resolve_styles(tree: &DomTree, sheet: &Stylesheet) -> HashMap<NodeIndex, ComputedStyle> {
    let mut styles = HashMap::new();
    resolve_recursive(tree, sheet, tree.root, None, &mut styles);
    styles
}

fn resolve_recursive(
    tree: &DomTree,
    sheet: &Stylesheet,
    idx: NodeIndex,
    parent: Option<&ComputedStyle>,
    styles: &mut HashMap<NodeIndex, ComputedStyle>,
) {
    let computed = ComputedStyle::cascade(tree, sheet, idx, parent);
    for child in tree.element_children(idx) {
        resolve_recursive(tree, sheet, child, Some(&computed), styles);
    }
    styles.insert(idx, computed);
}

/// Computed style of one node, attached or detached, by walking its ancestors.
pub fn resolve_style(tree: &DomTree, sheet: &Stylesheet, idx: NodeIndex) -> ComputedStyle {
    let mut chain = vec![idx];
    let mut current = tree.parent(idx);
    while let Some(p) = current {
        chain.push(p);
        current = tree.parent(p);
    }
    let mut computed: Option<ComputedStyle> = None;
    for node in chain.into_iter().rev() {
        computed = Some(ComputedStyle::cascade(tree, sheet, node, computed.as_ref()));
    }
    computed.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::parser::parse_document;

    #[test]
    fn inherited_properties_flow_down() {
        let tree = parse_document(
            r#"<html><head><style>.poster { font-size: 40px; color: red; z-index: 3 }</style></head>
            <body><div class="poster"><span id="s">x</span></div></body></html>"#,
        )
        .unwrap();
        let sheet = Stylesheet::from_tree(&tree);
        let styles = resolve_styles(&tree, &sheet);
        let span = tree.index_of(NodeId::intern("s")).unwrap();
        let style = &styles[&span];
        assert_eq!(style.get("font-size"), "40px");
        assert_eq!(style.get("color"), "red");
        // z-index does not inherit
        assert_eq!(style.z_index(), 0);
        assert_eq!(resolve_style(&tree, &sheet, span), *style);
    }

    #[test]
    fn inherit_keyword_copies_parent_value() {
        let tree = parse_document(
            r#"<div style="opacity: 0.4"><p id="p" style="opacity: inherit">t</p></div>"#,
        )
        .unwrap();
        let sheet = Stylesheet::from_tree(&tree);
        let p = tree.index_of(NodeId::intern("p")).unwrap();
        assert_eq!(resolve_style(&tree, &sheet, p).get("opacity"), "0.4");
    }
}
