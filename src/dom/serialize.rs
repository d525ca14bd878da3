//! HTML serialization: outer/inner markup and text content.
//!
//! Attached shadow roots serialize as declarative shadow DOM
//! (`<template shadowrootmode="open">`), which keeps snapshots readable.

use super::node::{NodeData, NodeId, NodeKind};
use super::tree::Dom;
use crate::markup::parser::{is_raw_text, is_void};

impl Dom {
    /// Serialize a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Serialize a node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self.get(id).and_then(NodeData::tag).is_some_and(is_raw_text);
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    /// Concatenated text of all text nodes below `id`, shadow roots excluded.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        match self.get(id).map(|d| &d.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, &mut out);
                }
            }
            None => {}
        }
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|d| &d.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::ShadowRoot) | None => {}
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn write_node(&self, id: NodeId, raw: bool, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) if raw => out.push_str(text),
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Document => {
                for &child in self.children(id) {
                    self.write_node(child, false, out);
                }
            }
            NodeKind::ShadowRoot => {
                out.push_str("<template shadowrootmode=\"open\">");
                for &child in self.children(id) {
                    self.write_node(child, false, out);
                }
                out.push_str("</template>");
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                write_attributes(data, out);
                out.push('>');
                if is_void(tag) {
                    return;
                }
                let raw = is_raw_text(tag);
                for &child in self.children(id) {
                    self.write_node(child, raw, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn write_attributes(data: &NodeData, out: &mut String) {
    let leading = ["id", "class"]
        .into_iter()
        .filter_map(|name| data.attribute(name).map(|value| (name.to_owned(), value)));
    for (name, value) in leading.chain(data.attributes.iter().cloned()) {
        out.push(' ');
        out.push_str(&name);
        if !value.is_empty() {
            out.push_str("=\"");
            escape_into(&value, true, out);
            out.push('"');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
