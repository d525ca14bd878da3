//! Document: the shared DOM, its ambient stylesheets and its event listeners.
//!
//! [`Document`] is a cheap-to-clone handle over one [`DocumentState`]. Every
//! method borrows the state for the shortest possible time and never holds a
//! borrow while user callbacks run, so listeners are free to mutate the DOM,
//! register listeners or dispatch further events.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::dom::{Dom, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::event::{DomEvent, EventType, ListenerRegistry};
use crate::markup::parse_fragment;

/// Everything a document owns.
#[derive(Debug)]
pub struct DocumentState {
    /// The node arena.
    pub dom: Dom,
    /// Event listeners per node.
    pub listeners: ListenerRegistry,
    document: NodeId,
    head: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
}

impl DocumentState {
    /// Remove a subtree from the arena together with its listeners.
    pub fn remove_subtree(&mut self, node: NodeId) -> usize {
        let removed = self.dom.remove(node);
        self.forget(&removed);
        removed.len()
    }

    /// Remove every child of `node` together with their listeners.
    pub fn clear_children(&mut self, node: NodeId) {
        let removed = self.dom.clear_children(node);
        self.forget(&removed);
    }

    fn forget(&mut self, removed: &[NodeId]) {
        for &node in removed {
            self.listeners.remove_node(node);
            if self.focused == Some(node) {
                self.focused = None;
            }
        }
    }
}

/// Shared handle to a document.
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Document")
                .field("nodes", &state.dom.len())
                .field("listeners", &state.listeners.len())
                .finish(),
            Err(_) => f.write_str("Document { <borrowed> }"),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with empty `<head>` and `<body>`.
    pub fn new() -> Self {
        let mut dom = Dom::new();
        let document = dom.insert(NodeData::document());
        let html = dom.insert_child(document, NodeData::element("html"));
        let head = dom.insert_child(html, NodeData::element("head"));
        let body = dom.insert_child(html, NodeData::element("body"));
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                dom,
                listeners: ListenerRegistry::new(),
                document,
                head,
                body,
                focused: None,
            })),
        }
    }

    /// Run `f` with shared access to the state.
    pub fn with<R>(&self, f: impl FnOnce(&DocumentState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Run `f` with exclusive access to the state.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut DocumentState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    /// Like [`with_mut`](Self::with_mut), but returns `None` instead of
    /// panicking when the state is already borrowed. Used from `Drop`.
    pub fn try_with_mut<R>(&self, f: impl FnOnce(&mut DocumentState) -> R) -> Option<R> {
        self.state.try_borrow_mut().ok().map(|mut state| f(&mut state))
    }

    /// Run `f` with shared access to the DOM.
    pub fn with_dom<R>(&self, f: impl FnOnce(&Dom) -> R) -> R {
        f(&self.state.borrow().dom)
    }

    /// Run `f` with exclusive access to the DOM.
    ///
    /// Nodes removed through this accessor keep their listeners registered;
    /// prefer [`DocumentState::remove_subtree`] for removal.
    pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut Dom) -> R) -> R {
        f(&mut self.state.borrow_mut().dom)
    }

    /// The document node.
    pub fn document_node(&self) -> NodeId {
        self.state.borrow().document
    }

    /// The `<head>` element.
    pub fn head(&self) -> NodeId {
        self.state.borrow().head
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    /// Find an element by id in the light DOM (shadow roots are not entered).
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.with(|state| state.dom.find_in_scope(state.document, id))
    }

    // ── Stylesheets ──────────────────────────────────────────────────

    /// Append a `<style>` element with `css` to `<head>`.
    pub fn add_stylesheet(&self, css: &str) -> NodeId {
        self.with_mut(|state| {
            let style = state.dom.insert_child(state.head, NodeData::element("style"));
            state.dom.insert_child(style, NodeData::text(css));
            style
        })
    }

    /// Append a `<link rel="stylesheet">` to `<head>`.
    pub fn add_stylesheet_link(&self, href: &str) -> NodeId {
        self.with_mut(|state| {
            state.dom.insert_child(
                state.head,
                NodeData::element("link")
                    .with_attribute("rel", "stylesheet")
                    .with_attribute("href", href),
            )
        })
    }

    /// Set the text of `<head><title>`, creating the element if needed.
    pub fn set_title(&self, title: &str) {
        let existing = self.with(|state| {
            state
                .dom
                .children(state.head)
                .iter()
                .copied()
                .find(|&node| state.dom.get(node).is_some_and(|d| d.is_tag("title")))
        });
        let node = existing.unwrap_or_else(|| {
            self.with_mut(|state| state.dom.insert_child(state.head, NodeData::element("title")))
        });
        self.set_text(node, title);
    }

    /// The ambient stylesheets every component imports: `<style>` and
    /// `<link rel="stylesheet">` children of `<head>`, in document order.
    pub fn ambient_stylesheets(&self) -> Vec<NodeId> {
        self.with(|state| {
            state
                .dom
                .children(state.head)
                .iter()
                .copied()
                .filter(|&node| {
                    state.dom.get(node).is_some_and(|d| {
                        d.is_tag("style")
                            || (d.is_tag("link") && d.attribute("rel").as_deref() == Some("stylesheet"))
                    })
                })
                .collect()
        })
    }

    // ── Content ──────────────────────────────────────────────────────

    /// Replace the children of `node` with the parsed `html`.
    pub fn set_inner_html(&self, node: NodeId, html: &str) {
        self.with_mut(|state| {
            state.clear_children(node);
            parse_fragment(&mut state.dom, node, html);
        });
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text(&self, node: NodeId, text: &str) {
        self.with_mut(|state| {
            state.clear_children(node);
            if !text.is_empty() {
                state.dom.insert_child(node, NodeData::text(text));
            }
        });
    }

    /// Replace the whole body content with `html`.
    pub fn replace_body(&self, html: &str) {
        let body = self.body();
        self.set_inner_html(body, html);
    }

    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        self.with_dom(|dom| dom.inner_html(node))
    }

    /// Remove a subtree (and its listeners) from the document.
    pub fn remove_node(&self, node: NodeId) -> usize {
        self.with_mut(|state| state.remove_subtree(node))
    }

    // ── Form values ──────────────────────────────────────────────────

    /// Read the value of a value-bearing element.
    pub fn value(&self, node: NodeId) -> Result<String> {
        self.with_dom(|dom| {
            dom.form_value(node).ok_or_else(|| {
                let data = dom.get(node);
                Error::NotValueElement {
                    id: data.and_then(|d| d.id.clone()).unwrap_or_default(),
                    tag: data.and_then(NodeData::tag).unwrap_or("#node").to_owned(),
                }
            })
        })
    }

    /// Write the value of a value-bearing element. Returns `false` for other nodes.
    pub fn set_value(&self, node: NodeId, value: &str) -> bool {
        self.with_dom_mut(|dom| dom.set_form_value(node, value))
    }

    /// Set the checked state of a checkbox or radio.
    pub fn set_checked(&self, node: NodeId, checked: bool) -> bool {
        self.with_dom_mut(|dom| dom.set_checked(node, checked))
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Register a listener on `node`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        event_type: impl Into<EventType>,
        callback: impl Fn(&DomEvent) + 'static,
    ) {
        let event_type = event_type.into();
        self.with_mut(|state| state.listeners.add(node, event_type, Rc::new(callback)));
    }

    /// Dispatch an event at `target` and bubble it up.
    ///
    /// Once the event leaves a shadow root, listeners above it see the
    /// shadow host as `target`/`target_id`, so a component's internal ids
    /// never reach its parents. `value` and `checked` stay those of the
    /// original target.
    ///
    /// Returns the number of listeners that ran.
    pub fn dispatch_event(&self, target: NodeId, event_type: impl Into<EventType>) -> usize {
        let event_type = event_type.into();
        let (path, mut event) = self.with(|state| {
            let dom = &state.dom;
            let mut path = Vec::new();
            let mut seen_as = target;
            for node in ListenerRegistry::bubble_path(dom, target) {
                path.push((node, seen_as));
                if dom.get(node).is_some_and(NodeData::is_shadow_root) {
                    if let Some(host) = dom.parent(node) {
                        seen_as = host;
                    }
                }
            }
            let mut event = DomEvent::new(event_type.clone(), target);
            event.target_id = dom.get(target).and_then(|d| d.id.clone());
            if event_type.carries_value() {
                event.value = dom.form_value(target);
                if dom.get(target).is_some_and(NodeData::is_checkable) {
                    event.checked = Some(dom.checked(target));
                }
            }
            (path, event)
        });
        trace!(event = %event_type, path = path.len(), "dispatching");

        let mut ran = 0;
        for (node, seen_as) in path {
            if seen_as != event.target {
                event.target = seen_as;
                event.target_id = self.with_dom(|dom| dom.get(seen_as).and_then(|d| d.id.clone()));
            }
            let callbacks = self.with(|state| state.listeners.matching(node, &event_type));
            event.set_current_target(node);
            for callback in callbacks {
                callback(&event);
                ran += 1;
            }
            if event.propagation_stopped() {
                break;
            }
        }
        ran
    }

    /// Dispatch a `click` at `node`.
    pub fn click(&self, node: NodeId) -> usize {
        self.dispatch_event(node, EventType::Click)
    }

    /// Move focus to `node`, firing `blur` on the previously focused node
    /// and `focus` on the new one.
    pub fn focus(&self, node: NodeId) {
        let previous = self.with_mut(|state| state.focused.replace(node));
        if previous == Some(node) {
            return;
        }
        if let Some(previous) = previous {
            self.dispatch_event(previous, EventType::Blur);
        }
        self.dispatch_event(node, EventType::Focus);
    }

    /// Remove focus from `node` (if focused) and fire `blur` on it.
    pub fn blur(&self, node: NodeId) {
        let was_focused = self.with_mut(|state| {
            let focused = state.focused == Some(node);
            if focused {
                state.focused = None;
            }
            focused
        });
        if was_focused {
            self.dispatch_event(node, EventType::Blur);
        }
    }

    /// The currently focused node.
    pub fn focused(&self) -> Option<NodeId> {
        self.state.borrow().focused
    }

    /// Whether two handles point at the same document.
    pub fn same_document(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}
