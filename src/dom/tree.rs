//! Tree operations: insert, detach, remove, reparent, walk, clone.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The DOM tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// A node without a parent is *detached*: it stays in the arena (with its
/// subtree) until it is re-attached or [`remove`](Dom::remove)d.
#[derive(Debug)]
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a detached node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.attach(id, parent, false);
        id
    }

    /// Insert a node as the first child of `parent`.
    pub fn insert_child_front(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.attach(id, parent, true);
        id
    }

    /// Detach `id` from its parent, keeping the node and its subtree alive.
    ///
    /// Returns `true` if the node had a parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.parent.remove(id) {
            Some(parent_id) => {
                if let Some(siblings) = self.children.get_mut(parent_id) {
                    siblings.retain(|&child| child != id);
                }
                true
            }
            None => false,
        }
    }

    /// Remove a node and all its descendants from the arena.
    ///
    /// Returns the ids of every removed node (the node itself first), or an
    /// empty vec if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }
        self.detach(id);

        if self.root == Some(id) {
            self.root = None;
        }

        let mut removed = Vec::new();
        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            if self.nodes.remove(current).is_some() {
                removed.push(current);
            }
        }
        removed
    }

    /// Remove every child of `id` (and their subtrees) from the arena.
    ///
    /// Returns the ids of every removed node.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let kids = self.children(id).to_vec();
        kids.into_iter().flat_map(|kid| self.remove(kid)).collect()
    }

    /// Move `node` to become the last (or first) child of `new_parent`.
    ///
    /// The node keeps its subtree intact. Moving a node under itself or one of
    /// its own descendants is refused and returns `false`.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId, at_front: bool) -> bool {
        if !self.contains(node) || !self.contains(new_parent) {
            return false;
        }
        if node == new_parent || self.ancestors(new_parent).contains(&node) {
            return false;
        }
        self.detach(node);
        self.attach(node, new_parent, at_front);
        true
    }

    fn attach(&mut self, node: NodeId, parent: NodeId, at_front: bool) {
        debug_assert!(self.nodes.contains_key(parent), "parent node does not exist");
        if let Some(kids) = self.children.get_mut(parent) {
            if at_front {
                kids.insert(0, node);
            } else {
                kids.push(node);
            }
            self.parent.insert(node, parent);
        }
    }

    /// Copy the subtree rooted at `id` into new, detached nodes.
    ///
    /// Returns the id of the copy's root, or `None` if `id` doesn't exist.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.nodes.get(id)?.clone();
        let copy = self.nodes.insert(data);
        self.children.insert(copy, Vec::new());
        for child in self.children(id).to_vec() {
            if let Some(child_copy) = self.deep_clone(child) {
                self.attach(child_copy, copy, false);
            }
        }
        Some(copy)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Children in document order; empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map_or(EMPTY_CHILDREN, Vec::as_slice)
    }

    /// Parent, grandparent, and so on up to the detached top of the tree.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.parent(id), |&node| self.parent(node)).collect()
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// First node ever inserted without a parent.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Nodes in the arena, attached or detached.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is still allocated.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// `start` and its subtree in document order (pre-order).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![start];
        while let Some(node) = pending.pop() {
            if self.contains(node) {
                order.push(node);
                pending.extend(self.children(node).iter().rev());
            }
        }
        order
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div").with_id("root"));
        let a = dom.insert_child(root, NodeData::element("section").with_id("a"));
        let b = dom.insert_child(root, NodeData::element("section").with_id("b"));
        let c = dom.insert_child(a, NodeData::element("button").with_id("c"));
        let d = dom.insert_child(a, NodeData::element("span").with_id("d"));
        (dom, root, a, b, c, d)
    }

    #[test]
    fn insert_sets_root() {
        let mut dom = Dom::new();
        let first = dom.insert(NodeData::element("div"));
        let _second = dom.insert(NodeData::element("div"));
        assert_eq!(dom.root(), Some(first));
    }

    #[test]
    fn insert_child_parent_relationship() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.parent(root), None);
    }

    #[test]
    fn insert_child_front_prepends() {
        let (mut dom, root, a, b, ..) = build_tree();
        let first = dom.insert_child_front(root, NodeData::element("header"));
        assert_eq!(dom.children(root), &[first, a, b]);
    }

    #[test]
    fn ancestors() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.ancestors(c), vec![a, root]);
        assert!(dom.ancestors(root).is_empty());
        assert!(dom.is_inclusive_descendant(c, root));
        assert!(!dom.is_inclusive_descendant(root, c));
    }

    #[test]
    fn detach_keeps_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        assert!(dom.detach(a));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.parent(a), None);
        assert_eq!(dom.children(a), &[c, d]);
        assert_eq!(dom.len(), 5);
        assert!(!dom.detach(a));
    }

    #[test]
    fn remove_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        let removed = dom.remove(a);
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0], a);
        assert!(!dom.contains(c));
        assert!(!dom.contains(d));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), 2);
    }

    #[test]
    fn remove_root_clears_root() {
        let (mut dom, root, ..) = build_tree();
        dom.remove(root);
        assert!(dom.is_empty());
        assert_eq!(dom.root(), None);
    }

    #[test]
    fn remove_nonexistent() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("x"));
        dom.remove(id);
        assert!(dom.remove(id).is_empty());
    }

    #[test]
    fn clear_children_empties_node() {
        let (mut dom, _root, a, ..) = build_tree();
        let removed = dom.clear_children(a);
        assert_eq!(removed.len(), 2);
        assert!(dom.children(a).is_empty());
    }

    #[test]
    fn reparent_moves_node() {
        let (mut dom, root, a, b, c, _d) = build_tree();
        assert!(dom.reparent(c, b, false));
        assert_eq!(dom.parent(c), Some(b));
        assert!(!dom.children(a).contains(&c));
        assert_eq!(dom.ancestors(c), vec![b, root]);
    }

    #[test]
    fn reparent_refuses_cycles() {
        let (mut dom, root, a, _b, c, _d) = build_tree();
        assert!(!dom.reparent(a, c, false));
        assert!(!dom.reparent(root, root, false));
        assert_eq!(dom.parent(a), Some(root));
    }

    #[test]
    fn deep_clone_copies_detached_subtree() {
        let (mut dom, _root, a, ..) = build_tree();
        let copy = dom.deep_clone(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(dom.parent(copy), None);
        assert_eq!(dom.children(copy).len(), 2);
        assert_eq!(dom.get(copy).unwrap().id.as_deref(), Some("a"));
        assert_eq!(dom.len(), 8);
    }

    #[test]
    fn walk_depth_first() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_depth_first(root), vec![root, a, c, d, b]);
        assert_eq!(dom.walk_depth_first(a), vec![a, c, d]);
    }

    #[test]
    fn default_impl() {
        let dom = Dom::default();
        assert!(dom.is_empty());
        assert_eq!(dom.root(), None);
    }
}
