//! Fragment parser: builds DOM nodes from an HTML template string.
//!
//! Deliberately forgiving, in the spirit of HTML: stray end tags are ignored,
//! unclosed elements are closed at the end of the fragment, and an end tag
//! closes every element opened after its matching start tag.

use logos::Logos;
use tracing::trace;

use super::tokenizer::{decode_entities, split_start_tag, Token};
use crate::dom::{Dom, NodeData, NodeId};

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is character data up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Whether `tag` is a void element.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Whether `tag` holds raw text.
pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parse `html` and append the resulting nodes as children of `parent`.
///
/// Returns the top-level nodes that were appended, in order.
pub fn parse_fragment(dom: &mut Dom, parent: NodeId, html: &str) -> Vec<NodeId> {
    let mut top_level = Vec::new();
    // (tag, node) for every open element; the fragment parent is the floor.
    let mut open: Vec<(String, NodeId)> = Vec::new();
    let mut lexer = Token::lexer(html);

    while let Some(result) = lexer.next() {
        let current = open.last().map_or(parent, |&(_, node)| node);
        let slice = lexer.slice();
        match result {
            Ok(Token::StartTag) => {
                let (tag, attributes, self_closing) = split_start_tag(slice);
                let mut data = NodeData::element(tag.clone());
                for (name, value) in attributes {
                    data.set_attribute(&name, value);
                }
                init_form_state(&mut data);
                let node = dom.insert_child(current, data);
                if current == parent {
                    top_level.push(node);
                }
                if is_raw_text(&tag) {
                    let rest = lexer.remainder();
                    let end = find_end_tag(rest, &tag).unwrap_or(rest.len());
                    if end > 0 {
                        let text = &rest[..end];
                        let text = if tag == "textarea" || tag == "title" {
                            decode_entities(text)
                        } else {
                            text.to_owned()
                        };
                        dom.insert_child(node, NodeData::text(text));
                    }
                    lexer.bump(end);
                    open.push((tag, node));
                } else if !self_closing && !is_void(&tag) {
                    open.push((tag, node));
                }
            }
            Ok(Token::EndTag) => {
                let tag = slice
                    .trim_start_matches("</")
                    .trim_end_matches('>')
                    .trim()
                    .to_ascii_lowercase();
                if let Some(pos) = open.iter().rposition(|(open_tag, _)| *open_tag == tag) {
                    open.truncate(pos);
                } else {
                    trace!(tag = %tag, "ignoring stray end tag");
                }
            }
            Ok(Token::Text) => {
                let node = append_text(dom, current, &decode_entities(slice));
                if current == parent {
                    top_level.extend(node);
                }
            }
            Ok(Token::Lt) | Err(()) => {
                let node = append_text(dom, current, slice);
                if current == parent {
                    top_level.extend(node);
                }
            }
            Ok(Token::Comment | Token::Doctype) => {}
        }
    }
    top_level
}

/// Append text to `parent`, merging with a trailing text node.
/// Returns the node id only when a new node was created.
fn append_text(dom: &mut Dom, parent: NodeId, text: &str) -> Option<NodeId> {
    if let Some(&last) = dom.children(parent).last() {
        if let Some(NodeData {
            kind: crate::dom::NodeKind::Text(existing),
            ..
        }) = dom.get_mut(last)
        {
            existing.push_str(text);
            return None;
        }
    }
    Some(dom.insert_child(parent, NodeData::text(text)))
}

/// Case-insensitive search for `</tag` in raw text.
fn find_end_tag(rest: &str, tag: &str) -> Option<usize> {
    let needle = format!("</{tag}");
    rest.to_ascii_lowercase().find(&needle)
}

/// Seed the live form state from the markup.
fn init_form_state(data: &mut NodeData) {
    if data.is_checkable() {
        data.checked = data.has_attribute("checked");
    }
    if data.is_tag("option") {
        data.selected = data.has_attribute("selected");
    }
}
