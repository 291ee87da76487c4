//! Markup parser → DomTree.
//!
//! Handles the subset of HTML that poster templates use: doctype, comments,
//! elements with quoted/unquoted/boolean attributes, void elements, raw-text
//! elements (`style`, `script`, ...), and text with basic entities.
//! Whitespace-only text is dropped. Mismatched end tags close up to the
//! nearest matching open element or are ignored; EOF closes everything.

use crate::id::NodeId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use winnow::ascii::multispace0;
use winnow::combinator::delimited;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script", "title", "textarea"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse a markup document into a `DomTree`.
#[must_use = "parsing result should be used"]
pub fn parse_document(input: &str) -> Result<DomTree, String> {
    let mut tree = DomTree::new();
    let mut open: Vec<(NodeIndex, String)> = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        let parent = open.last().map(|(idx, _)| *idx).unwrap_or(tree.root);

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or_else(|| "Unterminated comment".to_string())?;
            rest = &rest[4 + end + 3..];
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let body = parse_declaration
                .parse_next(&mut rest)
                .map_err(|e| format!("Declaration parse error: {e}"))?;
            if body
                .get(..7)
                .is_some_and(|head| head.eq_ignore_ascii_case("doctype"))
            {
                tree.doctype = Some(body.trim().to_string());
            }
        } else if rest.starts_with("</") {
            let name = parse_end_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("End tag parse error: {e}"))?;
            close_element(&mut open, &name);
        } else if starts_tag(rest) {
            let tag = parse_start_tag
                .parse_next(&mut rest)
                .map_err(|e| format!("Tag parse error: {e}"))?;
            let idx = insert_element(&mut tree, parent, &tag);

            if is_raw_text_element(&tag.name) {
                let body = take_raw_text(&mut rest, &tag.name);
                if !body.is_empty() {
                    tree.add_node(idx, DomNode::text(body));
                }
            } else if !tag.self_closing && !is_void_element(&tag.name) {
                open.push((idx, tag.name));
            }
        } else {
            let text = take_text(&mut rest);
            if !text.trim().is_empty() {
                append_text(&mut tree, parent, &decode_entities(text));
            }
        }
    }

    Ok(tree)
}

/// A parsed start tag.
#[derive(Debug)]
struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn insert_element(tree: &mut DomTree, parent: NodeIndex, tag: &StartTag) -> NodeIndex {
    let mut element = Element::new(&tag.name);
    for (name, value) in &tag.attrs {
        element.set_attr(name, value);
    }
    // Authored ids become node ids unless already taken by an earlier element.
    let id = match element.attr("id") {
        Some(authored) if !authored.is_empty() && tree.index_of(NodeId::intern(authored)).is_none() => {
            NodeId::intern(authored)
        }
        _ => NodeId::generated(),
    };
    tree.add_node(parent, DomNode::element(id, element))
}

fn close_element(open: &mut Vec<(NodeIndex, String)>, name: &str) {
    if let Some(pos) = open.iter().rposition(|(_, tag)| tag == name) {
        open.truncate(pos);
    }
}

/// Merge adjacent text so a stray `<` does not split one run into two nodes.
fn append_text(tree: &mut DomTree, parent: NodeIndex, text: &str) {
    if let Some(&last) = tree.children(parent).last()
        && let NodeKind::Text(existing) = &mut tree.graph[last].kind
    {
        existing.push_str(text);
        return;
    }
    tree.add_node(parent, DomNode::text(text));
}

// ─── Low-level parsers ──────────────────────────────────────────────────

/// Consume optional whitespace, newlines included.
fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

fn parse_tag_name(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == ':')
        .map(|s: &str| s.to_ascii_lowercase())
        .parse_next(input)
}

fn parse_attr_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
    })
    .parse_next(input)
}

fn parse_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    if input.starts_with('\'') {
        delimited('\'', take_till(0.., '\''), '\'').parse_next(input)
    } else {
        delimited('"', take_till(0.., '"'), '"').parse_next(input)
    }
}

fn parse_attribute(input: &mut &str) -> ModalResult<(String, String)> {
    let name = parse_attr_name.parse_next(input)?.to_ascii_lowercase();
    skip_space(input);
    if !input.starts_with('=') {
        return Ok((name, String::new()));
    }
    let _ = '='.parse_next(input)?;
    skip_space(input);

    let value = if input.starts_with('"') || input.starts_with('\'') {
        parse_quoted.parse_next(input)?
    } else {
        take_till(0.., |c: char| c.is_whitespace() || c == '>').parse_next(input)?
    };
    Ok((name, decode_entities(value)))
}

fn parse_start_tag(input: &mut &str) -> ModalResult<StartTag> {
    let _ = '<'.parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let mut attrs = Vec::new();

    loop {
        skip_space(input);
        if input.starts_with("/>") {
            *input = &input[2..];
            return Ok(StartTag {
                name,
                attrs,
                self_closing: true,
            });
        }
        if input.starts_with('>') {
            *input = &input[1..];
            return Ok(StartTag {
                name,
                attrs,
                self_closing: false,
            });
        }
        if input.is_empty() {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        if input.starts_with('/') {
            // Stray slash inside a tag (`<a / href=x>`).
            *input = &input[1..];
            continue;
        }
        attrs.push(parse_attribute.parse_next(input)?);
    }
}

fn parse_end_tag(input: &mut &str) -> ModalResult<String> {
    let _ = "</".parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let _ = take_till(0.., '>').parse_next(input)?;
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

/// `<!...>` or `<?...>`; returns the body between the markers.
fn parse_declaration<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let _ = '<'.parse_next(input)?;
    let _ = take_while(1, |c: char| c == '!' || c == '?').parse_next(input)?;
    let body = take_till(0.., '>').parse_next(input)?;
    let _ = '>'.parse_next(input)?;
    Ok(body)
}

/// Everything up to the matching `</tag`, consuming the end tag too.
fn take_raw_text<'a>(input: &mut &'a str, tag: &str) -> &'a str {
    let needle = format!("</{tag}");
    let lower = input.to_ascii_lowercase();
    match lower.find(&needle) {
        Some(pos) => {
            let body = &input[..pos];
            let after = &input[pos..];
            *input = after.find('>').map(|end| &after[end + 1..]).unwrap_or("");
            body
        }
        None => {
            let body = *input;
            *input = "";
            body
        }
    }
}

/// A text run up to the next tag. A `<` that does not open a tag is text.
fn take_text<'a>(input: &mut &'a str) -> &'a str {
    let start = *input;
    if input.starts_with('<') {
        *input = &input[1..];
    }
    let _: Result<&str, ErrMode<ContextError>> = take_till(0.., '<').parse_next(input);
    &start[..start.len() - input.len()]
}

/// Decode the basic named entities and numeric references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
