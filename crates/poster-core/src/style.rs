//! Style values: inline declarations, stylesheet rules, and resolved styles.
//!
//! Values are kept as CSS text. Numeric reads go through [`parse_px`] and
//! [`parse_int`], which follow `parseFloat`/`parseInt` semantics: a leading
//! number is taken and anything after it is ignored. `auto`, empty, or
//! unparsable values read as absent and callers fall back to 0.

use crate::model::{DomTree, NodeKind};
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ─── Numeric helpers ─────────────────────────────────────────────────────

/// Length of the leading `[-+]?digits[.digits]` run in `s`.
fn leading_number_len(s: &str, allow_fraction: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > digits_start;
    if allow_fraction && i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            has_digits = true;
            i = j;
        }
    }
    if has_digits { i } else { 0 }
}

/// Parse a CSS length the way `parseFloat` would (`"12.5px"` → 12.5).
pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let len = leading_number_len(value, true);
    if len == 0 {
        return None;
    }
    value[..len].parse::<f32>().ok()
}

/// Parse an integer the way `parseInt(value, 10)` would (`"3"` → 3, `"auto"` → None).
pub fn parse_int(value: &str) -> Option<i32> {
    let value = value.trim();
    let len = leading_number_len(value, false);
    if len == 0 {
        return None;
    }
    value[..len].parse::<i32>().ok()
}

/// Format a length in CSS pixels with at most two decimals (`30.0` → `"30px"`).
pub fn format_px(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0px".to_string();
    }
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        let s = format!("{rounded:.2}");
        format!("{}px", s.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// Strip a trailing `!important` flag from a declaration value.
fn strip_important(value: &str) -> &str {
    let trimmed = value.trim_end();
    match trimmed.to_ascii_lowercase().rfind("!important") {
        Some(pos) if pos + "!important".len() == trimmed.len() => trimmed[..pos].trim_end(),
        _ => trimmed,
    }
}

/// Split a declaration block into `(property, value)` pairs, honouring
/// quotes and parentheses so `url(a;b)` stays intact.
fn split_declarations(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    let mut push = |chunk: &str| {
        if let Some((prop, value)) = chunk.split_once(':') {
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if !prop.is_empty() && !value.is_empty() {
                out.push((prop, value.to_string()));
            }
        }
    };

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&text[start..]);
    out
}

// ─── Position mode ───────────────────────────────────────────────────────

/// Resolved `position` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl PositionMode {
    /// Whether the element takes part in offset-based placement and stacking.
    pub fn is_positioned(self) -> bool {
        !matches!(self, PositionMode::Static)
    }

    /// Whether the element is taken out of normal flow.
    pub fn is_out_of_flow(self) -> bool {
        matches!(self, PositionMode::Absolute | PositionMode::Fixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PositionMode::Static => "static",
            PositionMode::Relative => "relative",
            PositionMode::Absolute => "absolute",
            PositionMode::Fixed => "fixed",
            PositionMode::Sticky => "sticky",
        }
    }
}

impl FromStr for PositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(PositionMode::Static),
            "relative" => Ok(PositionMode::Relative),
            "absolute" => Ok(PositionMode::Absolute),
            "fixed" => Ok(PositionMode::Fixed),
            "sticky" => Ok(PositionMode::Sticky),
            other => Err(format!("unknown position mode `{other}`")),
        }
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Inline style ────────────────────────────────────────────────────────

/// Ordered inline declarations from an element's `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: SmallVec<[(String, String); 8]>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `style` attribute text. Later duplicates replace earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut style = Self::new();
        for (prop, value) in split_declarations(text) {
            style.set(&prop, &value);
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.trim().to_ascii_lowercase();
        self.decls
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set a declaration in place. An empty value removes it.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if property.is_empty() {
            return;
        }
        if value.is_empty() {
            self.remove(&property);
            return;
        }
        match self.decls.iter_mut().find(|(p, _)| *p == property) {
            Some((_, v)) => *v = value.to_string(),
            None => self.decls.push((property, value.to_string())),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let property = property.trim().to_ascii_lowercase();
        let pos = self.decls.iter().position(|(p, _)| *p == property)?;
        Some(self.decls.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Serialize as `prop: value; prop: value;`.
    pub fn to_css_text(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─── Selectors ───────────────────────────────────────────────────────────

/// One compound selector: `tag.class#id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = text;

        let tag_len = rest
            .find(|c: char| c == '.' || c == '#')
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        if !tag.is_empty() && tag != "*" {
            if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body
                .find(|c: char| c == '.' || c == '#')
                .unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return None;
            }
            if marker == '.' {
                compound.classes.push(name.to_string());
            } else {
                compound.id = Some(name.to_string());
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, tree: &DomTree, idx: NodeIndex) -> bool {
        let Some(element) = tree.graph[idx].as_element() else {
            return false;
        };
        if let Some(tag) = &self.tag
            && element.tag != *tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.attr("id") != Some(id.as_str())
        {
            return false;
        }
        self.classes.iter().all(|c| element.has_class(c))
    }
}

/// A descendant-combinator chain of compounds; the last one is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a single selector. Returns `None` for anything outside the
    /// supported subset (pseudo-classes, attribute selectors, `>`/`+`/`~`),
    /// which is treated as never matching.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.contains([':', '[', '>', '+', '~']) {
            return None;
        }
        let parts = text
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { parts })
    }

    /// `(ids, classes, tags)` specificity.
    pub fn specificity(&self) -> (u32, u32, u32) {
        self.parts.iter().fold((0, 0, 0), |(a, b, c), part| {
            (
                a + u32::from(part.id.is_some()),
                b + part.classes.len() as u32,
                c + u32::from(part.tag.is_some()),
            )
        })
    }

    pub fn matches(&self, tree: &DomTree, idx: NodeIndex) -> bool {
        let Some((subject, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !subject.matches(tree, idx) {
            return false;
        }
        // Greedy right-to-left ancestor walk is exact for descendant-only chains.
        let mut current = tree.parent(idx);
        for part in ancestors.iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = tree.parent(candidate);
                if part.matches(tree, candidate) {
                    break;
                }
            }
        }
        true
    }
}

// ─── Stylesheet ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: Selector,
    pub declarations: InlineStyle,
    /// Position in source order, used to break specificity ties.
    pub order: usize,
}

/// Rules collected from every `<style>` element of a document.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let mut sheet = Self::default();
        sheet.append_css(css);
        sheet
    }

    /// Gather the bodies of all attached `<style>` elements, in document order.
    pub fn from_tree(tree: &DomTree) -> Self {
        let mut sheet = Self::default();
        for idx in tree.descendants(tree.root) {
            if tree.graph[idx].tag() == Some("style") {
                sheet.append_css(&tree.text_content(idx));
            }
        }
        sheet
    }

    pub fn append_css(&mut self, css: &str) {
        let css = strip_comments(css);
        let mut rest = css.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let after = &rest[open + 1..];
            let close = matching_brace(after).unwrap_or(after.len());
            let body = &after[..close];
            rest = after.get(close + 1..).unwrap_or("");

            let declarations = InlineStyle::parse(body);
            for selector in prelude.split(',').filter_map(Selector::parse) {
                let order = self.rules.len();
                self.rules.push(StyleRule {
                    selector,
                    declarations: declarations.clone(),
                    order,
                });
            }
        }
    }

    /// Rules matching `idx`, sorted by ascending precedence.
    pub fn matching_rules(&self, tree: &DomTree, idx: NodeIndex) -> Vec<&StyleRule> {
        let mut matched: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(tree, idx))
            .collect();
        matched.sort_by_key(|rule| (rule.selector.specificity(), rule.order));
        matched
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing a block whose `{` was already consumed.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Skip an at-rule: either a `;`-terminated statement or a braced block.
fn skip_at_rule(s: &str) -> &str {
    let semi = s.find(';');
    let open = s.find('{');
    match (semi, open) {
        (Some(semi), Some(open)) if semi < open => &s[semi + 1..],
        (Some(semi), None) => &s[semi + 1..],
        (_, Some(open)) => {
            let after = &s[open + 1..];
            match matching_brace(after) {
                Some(close) => &after[close + 1..],
                None => "",
            }
        }
        (None, None) => "",
    }
}

// ─── Computed style ──────────────────────────────────────────────────────

/// Properties that flow from parent to child when not set explicitly.
pub const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "text-align",
    "visibility",
];

/// Initial value for a property with no cascaded value.
pub fn initial_value(property: &str) -> &'static str {
    match property {
        "position" => "static",
        "display" => "inline",
        "z-index" | "left" | "top" | "right" | "bottom" | "width" | "height" => "auto",
        "opacity" => "1",
        "background-image" => "none",
        "visibility" => "visible",
        "font-size" => "16px",
        "font-weight" => "400",
        "line-height" => "normal",
        "color" => "rgb(0, 0, 0)",
        _ => "",
    }
}

/// Default `display` for an element, as a user-agent stylesheet would set it.
pub fn default_display(tag: &str) -> &'static str {
    match tag {
        "head" | "style" | "script" | "meta" | "link" | "title" | "noscript" | "template" => {
            "none"
        }
        "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer" | "main"
        | "nav" | "aside" | "ul" | "ol" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        | "form" | "figure" | "blockquote" | "pre" | "hr" | "table" => "block",
        "img" | "button" | "input" | "select" | "textarea" => "inline-block",
        _ => "inline",
    }
}

/// The effective value of every property after the cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    props: BTreeMap<String, String>,
}

impl ComputedStyle {
    /// Effective value of `property`, falling back to its initial value.
    pub fn get(&self, property: &str) -> &str {
        self.props
            .get(property)
            .map(String::as_str)
            .unwrap_or_else(|| initial_value(property))
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.props.insert(property.to_string(), value.to_string());
    }

    pub fn position(&self) -> PositionMode {
        self.get("position").parse().unwrap_or_default()
    }

    /// Stacking value; `auto`, missing, or garbage all read as 0.
    pub fn z_index(&self) -> i32 {
        parse_int(self.get("z-index")).unwrap_or(0)
    }

    /// A length property in pixels; `auto` or missing reads as 0.
    pub fn px(&self, property: &str) -> f32 {
        parse_px(self.get(property)).unwrap_or(0.0)
    }

    /// A length property in pixels, or `None` when `auto`/unset.
    pub fn length(&self, property: &str) -> Option<f32> {
        parse_px(self.get(property))
    }

    pub fn is_display_none(&self) -> bool {
        self.get("display") == "none"
    }

    pub fn is_hidden(&self) -> bool {
        self.is_display_none() || self.get("visibility") == "hidden"
    }

    pub fn has_background_image(&self) -> bool {
        let value = self.get("background-image");
        !value.is_empty() && value != "none"
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Run the cascade for one node given its parent's computed style.
    pub fn cascade(
        tree: &DomTree,
        sheet: &Stylesheet,
        idx: NodeIndex,
        parent: Option<&ComputedStyle>,
    ) -> ComputedStyle {
        let mut computed = ComputedStyle::default();

        if let Some(parent) = parent {
            for &prop in INHERITED_PROPERTIES {
                if let Some(value) = parent.props.get(prop) {
                    computed.set(prop, value);
                }
            }
        }

        let NodeKind::Element(element) = &tree.graph[idx].kind else {
            return computed;
        };
        computed.set("display", default_display(&element.tag));

        let mut apply = |prop: &str, value: &str| {
            let value = strip_important(value);
            match value {
                "inherit" => match parent.and_then(|p| p.props.get(prop)) {
                    Some(inherited) => computed.set(prop, inherited),
                    None => {
                        computed.props.remove(prop);
                    }
                },
                "initial" | "unset" => {
                    computed.props.remove(prop);
                }
                _ => computed.set(prop, value),
            }
        };

        for rule in sheet.matching_rules(tree, idx) {
            for (prop, value) in rule.declarations.iter() {
                apply(prop, value);
            }
        }
        for (prop, value) in element.style.iter() {
            apply(prop, value);
        }

        computed
    }
}
