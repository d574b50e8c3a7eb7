//! FreeMind (`.mm`) import
//!
//! FreeMind stores a map as nested `<node>` elements under a `<map>` root,
//! with the node text in the `TEXT` attribute:
//!
//! ```text
//! <map version="0.7.1">
//!   <node ID="1" TEXT="Root">
//!     <node TEXT="Right child"/>
//!     <node TEXT="Left child" POSITION="left"/>
//!   </node>
//! </map>
//! ```
//!
//! The import is lossy, so it never fails: markup that cannot be read
//! produces an empty map instead of an error.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::{json, Map, Value};

use super::RawContent;
use crate::core::document::Document;
use crate::core::error::DecodeError;

/// Format version stamped on imported maps
pub const FORMAT_VERSION: u64 = 2;

/// Deepest element nesting accepted, the same limit serde_json puts on JSON
pub const MAX_DEPTH: usize = 128;

static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<\?.*?\?>|<!DOCTYPE[^>]*>")
        .expect("ignored markup pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<(/?)([A-Za-z_][\w:.\-]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#,
    )
    .expect("tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
});

/// A markup element with its attributes and child elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Find the first element with the given name, depth first
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

/// Parse markup into its top-level elements
///
/// Text content is dropped; FreeMind keeps everything it needs in attributes.
/// Nesting deeper than [`MAX_DEPTH`] is an error, which keeps the recursive
/// walks over the resulting tree bounded.
pub fn parse_elements(markup: &str) -> Result<Vec<Element>, String> {
    let markup = IGNORED.replace_all(markup, "");
    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    for caps in TAG.captures_iter(&markup) {
        let closing = !caps[1].is_empty();
        let name = caps[2].to_string();
        let self_closing = !caps[4].is_empty();

        if closing {
            let element = stack
                .pop()
                .ok_or_else(|| format!("Unexpected closing tag </{}>", name))?;
            if element.name != name {
                return Err(format!(
                    "Mismatched closing tag </{}>, expected </{}>",
                    name, element.name
                ));
            }
            attach(&mut stack, &mut roots, element);
            continue;
        }

        let attributes = ATTRIBUTE
            .captures_iter(&caps[3])
            .map(|attr| {
                let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
                (attr[1].to_string(), unescape(value))
            })
            .collect();
        let element = Element {
            name,
            attributes,
            children: Vec::new(),
        };

        if self_closing {
            attach(&mut stack, &mut roots, element);
        } else if stack.len() >= MAX_DEPTH {
            return Err("Markup nested too deeply".to_string());
        } else {
            stack.push(element);
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("Unclosed tag <{}>", open.name));
    }
    Ok(roots)
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Replace XML character and entity references
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(end) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                // Not a reference, keep the ampersand literally
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Convert a FreeMind `<node>` into an idea, numbering ideas in pre-order
fn to_idea(node: &Element, next_id: &mut u64) -> Value {
    let mut idea = Map::new();
    idea.insert("title".to_string(), json!(node.attr("TEXT").unwrap_or("")));
    idea.insert("id".to_string(), json!(*next_id));
    *next_id += 1;

    if let Some(background) = node.attr("BACKGROUND_COLOR") {
        idea.insert(
            "attr".to_string(),
            json!({ "style": { "background": background } }),
        );
    }

    let mut ideas = Map::new();
    for (index, child) in node.children_named("node").enumerate() {
        let rank = index as i64 + 1;
        let rank = if child.attr("POSITION") == Some("left") {
            -rank
        } else {
            rank
        };
        ideas.insert(rank.to_string(), to_idea(child, next_id));
    }
    if !ideas.is_empty() {
        idea.insert("ideas".to_string(), Value::Object(ideas));
    }

    Value::Object(idea)
}

/// Import FreeMind markup as a map
pub fn import(markup: &str) -> Result<Value, String> {
    let roots = parse_elements(markup)?;
    let map = roots
        .iter()
        .find_map(|root| root.find("map"))
        .ok_or_else(|| "No <map> element".to_string())?;
    let root = map
        .children_named("node")
        .next()
        .ok_or_else(|| "Map has no root node".to_string())?;

    let mut next_id = 1;
    let mut idea = to_idea(root, &mut next_id);
    if let Value::Object(fields) = &mut idea {
        fields.insert("formatVersion".to_string(), json!(FORMAT_VERSION));
    }
    Ok(idea)
}

/// Map produced when the markup cannot be imported
pub fn empty_map() -> Value {
    json!({ "title": "", "id": 1, "formatVersion": FORMAT_VERSION })
}

/// Decode FreeMind content, degrading to an empty map on bad markup
pub fn decode(content: RawContent, map_id: &str) -> Result<Document, DecodeError> {
    let markup = match content {
        RawContent::Text(markup) => markup,
        RawContent::Structured(value) => return Ok(Document::new(value)),
    };

    match import(&markup) {
        Ok(idea) => Ok(Document::new(idea)),
        Err(e) => {
            tracing::warn!("Could not import FreeMind map {}: {}", map_id, e);
            Ok(Document::new(empty_map()))
        }
    }
}
