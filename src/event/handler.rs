//! Listener registry and bubble path computation.
//!
//! [`ListenerRegistry`] stores callbacks per node and event type. It does not
//! dispatch by itself: [`Document`](crate::document::Document) computes the
//! bubble path, snapshots the matching callbacks while holding its borrow,
//! then releases the borrow before running them.

use std::fmt;
use std::rc::Rc;

use slotmap::SecondaryMap;

use super::dom_event::{DomEvent, EventType};
use crate::dom::{Dom, NodeId};

/// A registered DOM event callback.
pub type ListenerFn = Rc<dyn Fn(&DomEvent)>;

/// Per-node event listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: SecondaryMap<NodeId, Vec<(EventType, ListenerFn)>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("nodes", &self.listeners.len())
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event_type` on `node`. Registrations are never
    /// deduplicated.
    pub fn add(&mut self, node: NodeId, event_type: EventType, callback: ListenerFn) {
        if let Some(list) = self.listeners.get_mut(node) {
            list.push((event_type, callback));
        } else {
            self.listeners.insert(node, vec![(event_type, callback)]);
        }
    }

    /// Drop every listener attached to `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        self.listeners.remove(node);
    }

    /// Callbacks registered on `node` for `event_type`, in registration order.
    pub fn matching(&self, node: NodeId, event_type: &EventType) -> Vec<ListenerFn> {
        self.listeners
            .get(node)
            .map(|list| {
                list.iter()
                    .filter(|(ty, _)| ty == event_type)
                    .map(|(_, cb)| Rc::clone(cb))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners on `node`.
    pub fn count(&self, node: NodeId) -> usize {
        self.listeners.get(node).map_or(0, Vec::len)
    }

    /// Total number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute the bubble path from `start` up to the topmost ancestor (inclusive).
    ///
    /// Returns `[start, parent, grandparent, ...]`. Shadow roots are crossed,
    /// so events raised inside a component reach listeners on its host and
    /// beyond. If `start` does not exist in the DOM, returns an empty vec.
    pub fn bubble_path(dom: &Dom, start: NodeId) -> Vec<NodeId> {
        if !dom.contains(start) {
            return Vec::new();
        }
        let mut path = vec![start];
        path.extend(dom.ancestors(start));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeData;

    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///    |
    ///  shadow
    ///    |
    ///    c
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("body"));
        let a = dom.insert_child(root, NodeData::element("div"));
        let b = dom.insert_child(root, NodeData::element("div"));
        let shadow = dom.insert_child(a, NodeData::shadow_root());
        let c = dom.insert_child(shadow, NodeData::element("button"));
        (dom, root, a, b, c)
    }

    #[test]
    fn bubble_path_crosses_shadow_roots() {
        let (dom, root, a, _, c) = build_tree();
        let path = ListenerRegistry::bubble_path(&dom, c);
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], c);
        assert_eq!(path[2], a);
        assert_eq!(path[3], root);
    }

    #[test]
    fn bubble_path_nonexistent_node() {
        let (mut dom, ..) = build_tree();
        let stale = dom.insert(NodeData::element("ghost"));
        dom.remove(stale);
        assert!(ListenerRegistry::bubble_path(&dom, stale).is_empty());
    }

    #[test]
    fn matching_filters_by_type_and_keeps_order() {
        let (_, root, a, b, _) = build_tree();
        let mut registry = ListenerRegistry::new();
        registry.add(a, EventType::Click, Rc::new(|_| {}));
        registry.add(a, EventType::Input, Rc::new(|_| {}));
        registry.add(a, EventType::Click, Rc::new(|_| {}));
        assert_eq!(registry.matching(a, &EventType::Click).len(), 2);
        assert_eq!(registry.matching(a, &EventType::Blur).len(), 0);
        assert_eq!(registry.matching(b, &EventType::Click).len(), 0);
        assert_eq!(registry.count(a), 3);
        assert_eq!(registry.count(root), 0);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_node_drops_its_listeners() {
        let (_, _, a, b, _) = build_tree();
        let mut registry = ListenerRegistry::new();
        registry.add(a, EventType::Click, Rc::new(|_| {}));
        registry.add(b, EventType::Click, Rc::new(|_| {}));
        registry.remove_node(a);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
