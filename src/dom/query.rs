//! DOM queries: by id, class, tag; scoped lookups; generic predicate matching.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Find the first node whose `id` field matches the given string.
    ///
    /// Iterates all nodes in the arena (not just the tree rooted at `root`).
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.iter_nodes()
            .find(|(_, data)| data.id.as_deref() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Find all nodes that have the given class.
    pub fn query_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query_all(|data| data.has_class(class))
    }

    /// Find all elements with the given tag name.
    pub fn query_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.query_all(|data| data.is_tag(tag))
    }

    /// Find all nodes matching an arbitrary predicate.
    pub fn query_all(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.iter_nodes()
            .filter(|(_, data)| predicate(data))
            .map(|(node_id, _)| node_id)
            .collect()
    }

    /// Find the first node below `scope` (in tree order) whose id matches.
    ///
    /// The search never enters a shadow root other than `scope` itself, so the
    /// internals of nested components stay invisible to their parents.
    pub fn find_in_scope(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let Some(data) = self.get(current) else {
                continue;
            };
            if data.is_shadow_root() {
                continue;
            }
            if data.id.as_deref() == Some(id) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        None
    }

    /// Find the first node in the subtree of `start` (inclusive, tree order)
    /// matching a predicate. Shadow roots are entered.
    pub fn find_descendant(
        &self,
        start: NodeId,
        predicate: impl Fn(&NodeData) -> bool,
    ) -> Option<NodeId> {
        self.walk_depth_first(start)
            .into_iter()
            .find(|&node| self.get(node).is_some_and(&predicate))
    }

    /// The nearest shadow root (or the topmost ancestor) containing `node`.
    pub fn scope_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if self.get(parent).is_some_and(NodeData::is_shadow_root) {
                return parent;
            }
            current = parent;
        }
        current
    }

    /// Iterate over all `(NodeId, &NodeData)` pairs in the arena.
    ///
    /// This is a helper used by the query methods. It iterates in slotmap
    /// insertion order, which is deterministic but not tree-order.
    fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }
}
