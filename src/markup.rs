//! Read-only access to parsed HTML: body lookup, tag/attribute helpers, text
//! extraction and block-level node classification.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Block-level kinds the converter knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    Table,
    Division,
    Preformatted,
    Other,
}

pub fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

/// Elements whose content is raw text, so a `<body` inside them is not a tag.
const RAW_TEXT_TAGS: [&str; 6] = ["script", "style", "textarea", "title", "xmp", "noscript"];

/// html5ever always synthesizes a `<body>`, so whether the author wrote one is
/// decided on the source text. Comments and raw-text elements are skipped.
pub fn has_body_tag(input: &str) -> bool {
    let low = input.to_ascii_lowercase();
    let mut i = 0;
    while let Some(rel) = low[i..].find('<') {
        let lt = i + rel;
        let rest = &low[lt..];

        if rest.starts_with("<!--") {
            let Some(end) = rest[4..].find("-->") else {
                return false;
            };
            i = lt + 4 + end + 3;
            continue;
        }

        let name_len = rest[1..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len() - 1);
        let name = &rest[1..1 + name_len];
        let delimited = rest[1 + name_len..]
            .chars()
            .next()
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace());

        if name == "body" && delimited {
            return true;
        }
        if RAW_TEXT_TAGS.contains(&name) {
            let close = format!("</{name}");
            let Some(end) = rest.find(&close) else {
                return false;
            };
            i = lt + end + close.len();
            continue;
        }
        i = lt + 1;
    }
    false
}

pub fn find_body(node: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data {
        if name.local.to_string().eq_ignore_ascii_case("body") {
            return Some(node.clone());
        }
    }
    for child in node.children.borrow().iter() {
        if let Some(body) = find_body(child) {
            return Some(body);
        }
    }
    None
}

pub fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

pub fn attr_get(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.to_string().eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    attr_get(node, "class")
        .map(|v| v.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Element children only; text, comments and processing instructions are
/// dropped.
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| matches!(c.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// Direct element children whose tag is one of `tags`.
pub fn children_named(node: &Handle, tags: &[&str]) -> Vec<Handle> {
    element_children(node)
        .into_iter()
        .filter(|c| tag_lower(c).is_some_and(|t| tags.contains(&t.as_str())))
        .collect()
}

/// All descendants (document order) whose tag is `tag`.
pub fn descendants_named(node: &Handle, tag: &str) -> Vec<Handle> {
    fn walk(node: &Handle, tag: &str, out: &mut Vec<Handle>) {
        for c in node.children.borrow().iter() {
            if tag_lower(c).as_deref() == Some(tag) {
                out.push(c.clone());
            }
            walk(c, tag, out);
        }
    }
    let mut out = Vec::new();
    walk(node, tag, &mut out);
    out
}

pub fn contains_any_tag(node: &Handle, tags: &[&str]) -> bool {
    node.children.borrow().iter().any(|c| {
        tag_lower(c).is_some_and(|t| tags.contains(&t.as_str())) || contains_any_tag(c, tags)
    })
}

/// Raw concatenation of every descendant text node.
pub fn text_content(node: &Handle) -> String {
    fn walk(node: &Handle, out: &mut String) {
        for c in node.children.borrow().iter() {
            match &c.data {
                NodeData::Text { contents } => out.push_str(&contents.borrow()),
                NodeData::Element { .. } => walk(c, out),
                _ => {}
            }
        }
    }
    let mut out = String::new();
    walk(node, &mut out);
    out
}

pub fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}

/// Inline text as it reads on the page: whitespace runs collapsed, ends
/// trimmed.
pub fn inline_text(node: &Handle) -> String {
    collapse_ws(&text_content(node)).trim().to_string()
}

/// Tags that start a new line when rendered, so their text must not run into
/// the text around them.
const BLOCK_TAGS: [&str; 7] = ["ul", "ol", "li", "p", "div", "br", "table"];

/// [`inline_text`] for list items: nested blocks (sub-lists, paragraphs) are
/// kept but separated from the surrounding text by a space.
pub fn item_text(node: &Handle) -> String {
    fn walk(node: &Handle, out: &mut String) {
        for c in node.children.borrow().iter() {
            match &c.data {
                NodeData::Text { contents } => out.push_str(&contents.borrow()),
                NodeData::Element { .. } => {
                    let block = tag_lower(c).is_some_and(|t| BLOCK_TAGS.contains(&t.as_str()));
                    if block {
                        out.push(' ');
                    }
                    walk(c, out);
                    if block {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
    }
    let mut out = String::new();
    walk(node, &mut out);
    collapse_ws(&out).trim().to_string()
}

pub fn classify(node: &Handle) -> NodeKind {
    let Some(tag) = tag_lower(node) else {
        return NodeKind::Other;
    };
    match tag.as_str() {
        "h1" => NodeKind::Heading(1),
        "h2" => NodeKind::Heading(2),
        "h3" => NodeKind::Heading(3),
        "p" => NodeKind::Paragraph,
        "ul" => NodeKind::UnorderedList,
        "ol" => NodeKind::OrderedList,
        "table" => NodeKind::Table,
        "div" => NodeKind::Division,
        "pre" => NodeKind::Preformatted,
        _ => NodeKind::Other,
    }
}
