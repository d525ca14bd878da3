//! Node types: NodeId, NodeKind, NodeData.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. Parent of `<html>`.
    Document,
    /// An element with a lowercase tag name.
    Element(String),
    /// A text node.
    Text(String),
    /// An attached shadow root. Id queries never cross into one from outside.
    ShadowRoot,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Element, text, shadow root or document.
    pub kind: NodeKind,
    /// Optional unique id (`id` attribute).
    pub id: Option<String>,
    /// Class tokens (`class` attribute), in insertion order.
    pub classes: Vec<String>,
    /// Remaining attributes, in insertion order.
    pub attributes: Vec<(String, String)>,
    /// Live form value. `None` until written; falls back to the `value` attribute.
    pub value: Option<String>,
    /// Live checkedness of checkbox/radio inputs.
    pub checked: bool,
    /// Live selectedness of `<option>` elements.
    pub selected: bool,
}

impl NodeData {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            value: None,
            checked: false,
            selected: false,
        }
    }

    /// Create a new element node. The tag is lowercased.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into().to_ascii_lowercase()))
    }

    /// Create a new text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(text.into()))
    }

    /// Create a new shadow root node.
    pub fn shadow_root() -> Self {
        Self::with_kind(NodeKind::ShadowRoot)
    }

    /// Create the document node.
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Set the id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Add multiple classes (builder).
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for class in classes {
            let class = class.into();
            if !self.classes.contains(&class) {
                self.classes.push(class);
            }
        }
        self
    }

    /// Set an attribute (builder).
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Element tag name, or `None` for non-element nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Whether this is an element with the given tag.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    /// Whether this is a shadow root.
    pub fn is_shadow_root(&self) -> bool {
        self.kind == NodeKind::ShadowRoot
    }

    /// Whether this element carries form-value semantics
    /// (`input`, `textarea`, `select`, `option`).
    pub fn has_value_semantics(&self) -> bool {
        matches!(self.tag(), Some("input" | "textarea" | "select" | "option"))
    }

    /// Whether this is a checkbox or radio input.
    pub fn is_checkable(&self) -> bool {
        self.is_tag("input")
            && matches!(self.attribute("type").as_deref(), Some("checkbox" | "radio"))
    }

    // ── Classes ──────────────────────────────────────────────────────

    /// Check whether this node has a given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
    }

    /// Remove a class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Toggle a class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) {
        if self.has_class(class) {
            self.remove_class(class);
        } else {
            self.add_class(class);
        }
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Read an attribute. `id` and `class` are served from their dedicated fields.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if self.classes.is_empty() => None,
            "class" => Some(self.classes.join(" ")),
            _ => self
                .attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        match name {
            "id" => self.id.is_some(),
            "class" => !self.classes.is_empty(),
            _ => self.attributes.iter().any(|(n, _)| n == name),
        }
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            "id" => self.id = Some(value),
            "class" => {
                self.classes.clear();
                for token in value.split_whitespace() {
                    self.add_class(token);
                }
            }
            _ => {
                if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n == name) {
                    slot.1 = value;
                } else {
                    self.attributes.push((name.to_owned(), value));
                }
            }
        }
    }

    /// Remove an attribute. No-op if absent.
    pub fn remove_attribute(&mut self, name: &str) {
        match name {
            "id" => self.id = None,
            "class" => self.classes.clear(),
            _ => self.attributes.retain(|(n, _)| n != name),
        }
    }
}
