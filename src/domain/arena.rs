use generational_arena::{Arena, Index};
use std::fmt;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node inside a [`TreeArena`].
///
/// Handles are generational: a handle to a removed node never resolves to a
/// node inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    /// Display label, not required to be unique
    pub id: String,
    /// Opaque payload
    pub data: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<T> TreeNode<T> {
    /// Parent handle, None for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in display order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based tree with parent back-references.
///
/// Children are owned as an ordered list of handles, the parent is a
/// non-owning handle. Every structural mutation checks its preconditions
/// before touching any node, so a failed call leaves the arena unchanged.
#[derive(Debug, Clone)]
pub struct TreeArena<T> {
    arena: Arena<TreeNode<T>>,
    /// Designated root, the first node inserted without a parent
    root: Option<NodeId>,
}

impl<T> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeArena<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Creates a node and appends it to `parent`'s children.
    #[instrument(level = "trace", skip(self, id, data))]
    pub fn insert_node(
        &mut self,
        id: impl Into<String>,
        data: T,
        parent: Option<NodeId>,
    ) -> DomainResult<NodeId> {
        if let Some(parent_idx) = parent {
            self.node(parent_idx)?;
        }
        let node = TreeNode {
            id: id.into(),
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = NodeId(self.arena.insert(node));

        match parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx.0) {
                    parent.children.push(node_idx);
                }
            }
            None => {
                if self.root.is_none() {
                    self.root = Some(node_idx);
                }
            }
        }

        Ok(node_idx)
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode<T>> {
        self.arena.get(idx.0)
    }

    /// Mutable access to label and payload; structure stays private.
    pub fn get_node_mut(&mut self, idx: NodeId) -> Option<&mut TreeNode<T>> {
        self.arena.get_mut(idx.0)
    }

    /// Like [`get_node`](Self::get_node) but fails with `InvalidNode`.
    pub fn node(&self, idx: NodeId) -> DomainResult<&TreeNode<T>> {
        self.get_node(idx).ok_or(DomainError::InvalidNode(idx))
    }

    pub fn contains(&self, idx: NodeId) -> bool {
        self.arena.contains(idx.0)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn parent(&self, idx: NodeId) -> Option<NodeId> {
        self.get_node(idx).and_then(|node| node.parent)
    }

    /// Children of `idx`; empty for unknown handles.
    pub fn children(&self, idx: NodeId) -> &[NodeId] {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn rename(&mut self, idx: NodeId, id: impl Into<String>) -> DomainResult<()> {
        let node = self
            .get_node_mut(idx)
            .ok_or(DomainError::InvalidNode(idx))?;
        node.id = id.into();
        Ok(())
    }

    /// True iff walking the parent chain from `idx` (excluding `idx`) reaches `candidate`.
    pub fn has_ancestor(&self, idx: NodeId, candidate: NodeId) -> bool {
        let mut current = self.parent(idx);
        while let Some(node) = current {
            if node == candidate {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Reassigns the parent of `idx`.
    ///
    /// Fails with `CircularTree` when `new_parent` is `idx` itself or one of its
    /// descendants. The old parent loses `idx`, the new parent gains it at the end
    /// of its child list.
    #[instrument(level = "debug", skip(self))]
    pub fn set_parent(&mut self, idx: NodeId, new_parent: Option<NodeId>) -> DomainResult<()> {
        let old_parent = self.node(idx)?.parent;
        if let Some(parent_idx) = new_parent {
            self.node(parent_idx)?;
            if parent_idx == idx || self.has_ancestor(parent_idx, idx) {
                debug!("Rejected reparent of {} under {}", idx, parent_idx);
                return Err(DomainError::CircularTree {
                    node: idx,
                    parent: parent_idx,
                });
            }
        }

        if let Some(old_idx) = old_parent {
            if let Some(old) = self.arena.get_mut(old_idx.0) {
                old.children.retain(|&child| child != idx);
            }
        }
        if let Some(parent_idx) = new_parent {
            if let Some(parent) = self.arena.get_mut(parent_idx.0) {
                parent.children.push(idx);
            }
        }
        if let Some(node) = self.arena.get_mut(idx.0) {
            node.parent = new_parent;
        }

        if self.root == Some(idx) && new_parent.is_some() {
            self.root = Some(self.top_of(idx));
        }
        Ok(())
    }

    /// Topmost ancestor of `idx` (itself when parentless).
    pub fn top_of(&self, idx: NodeId) -> NodeId {
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Sorts the immediate children of `idx` by display id.
    pub fn sort(&mut self, idx: NodeId) -> DomainResult<()> {
        self.sort_by_key(idx, |node| node.id.clone())
    }

    /// Sorts the immediate children of `idx` by `key`, display id breaking ties.
    ///
    /// Does not recurse; the sort is stable.
    pub fn sort_by_key<K, F>(&mut self, idx: NodeId, mut key: F) -> DomainResult<()>
    where
        K: Ord,
        F: FnMut(&TreeNode<T>) -> K,
    {
        let children = self.node(idx)?.children.clone();
        let mut keyed: Vec<(K, String, NodeId)> = children
            .into_iter()
            .filter_map(|child| {
                self.get_node(child)
                    .map(|node| (key(node), node.id.clone(), child))
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        if let Some(node) = self.arena.get_mut(idx.0) {
            node.children = keyed.into_iter().map(|(_, _, child)| child).collect();
        }
        Ok(())
    }

    /// Applies [`sort`](Self::sort) to every node of the subtree at `idx`.
    #[instrument(level = "debug", skip(self))]
    pub fn sort_recursive(&mut self, idx: NodeId) -> DomainResult<()> {
        self.node(idx)?;
        for node in self.unroll(idx) {
            self.sort(node)?;
        }
        Ok(())
    }

    /// Visits the subtree at `idx` exactly once per node.
    ///
    /// Order: `idx`, then its direct children, then for each child in order the
    /// rest of that child's own unroll. For root -> [A, B, C], A -> [D],
    /// C -> [E, F] this yields root, A, B, C, D, E, F.
    pub fn unroll(&self, idx: NodeId) -> Vec<NodeId> {
        if !self.contains(idx) {
            return Vec::new();
        }
        let mut nodes = vec![idx];
        self.unroll_rest(idx, &mut nodes);
        nodes
    }

    fn unroll_rest(&self, idx: NodeId, nodes: &mut Vec<NodeId>) {
        let children = self.children(idx);
        nodes.extend_from_slice(children);
        for &child in children {
            self.unroll_rest(child, nodes);
        }
    }

    /// Removes `idx` and everything below it. Returns the number of removed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, idx: NodeId) -> DomainResult<usize> {
        self.set_parent(idx, None)?;
        let doomed = self.unroll(idx);
        for &node in &doomed {
            self.arena.remove(node.0);
        }
        if self.root == Some(idx) {
            self.root = None;
        }
        trace!("Removed {} nodes below {}", doomed.len(), idx);
        Ok(doomed.len())
    }

    /// Pre-order traversal from the designated root.
    pub fn iter(&self) -> TreeIterator<'_, T> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree at `idx`.
    pub fn iter_from(&self, idx: NodeId) -> TreeIterator<'_, T> {
        TreeIterator::new(self, Some(idx))
    }

    /// Post-order traversal from the designated root.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self, self.root)
    }

    /// Post-order traversal of the subtree at `idx`.
    pub fn postorder_from(&self, idx: NodeId) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self, Some(idx))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        1 + self
            .children(node_idx)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Leaf nodes below the designated root, left to right.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(idx, _)| idx)
            .collect()
    }
}

pub struct TreeIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> TreeIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>, start: Option<NodeId>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<(NodeId, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>, start: Option<NodeId>) -> Self {
        Self {
            arena,
            stack: start.into_iter().map(|idx| (idx, false)).collect(),
        }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (NodeId, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if visited {
                    return Some((current_idx, node));
                }
                self.stack.push((current_idx, true));
                for &child in node.children.iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (TreeArena<u32>, Vec<NodeId>) {
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", 0, None).unwrap();
        let a = tree.insert_node("A", 1, Some(root)).unwrap();
        let b = tree.insert_node("B", 2, Some(root)).unwrap();
        let c = tree.insert_node("C", 3, Some(root)).unwrap();
        let d = tree.insert_node("D", 4, Some(a)).unwrap();
        let e = tree.insert_node("E", 5, Some(c)).unwrap();
        let f = tree.insert_node("F", 6, Some(c)).unwrap();
        (tree, vec![root, a, b, c, d, e, f])
    }

    #[test]
    fn test_insert_assigns_corresponding_child() {
        let (tree, ids) = sample();
        assert_eq!(tree.root(), Some(ids[0]));
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[2], ids[3]]);
        assert_eq!(tree.parent(ids[4]), Some(ids[1]));
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_unroll_is_two_phase() {
        let (tree, ids) = sample();
        assert_eq!(tree.unroll(ids[0]), ids);
    }

    #[test]
    fn test_iterators_visit_every_node_once() {
        let (tree, ids) = sample();
        let pre: Vec<NodeId> = tree.iter().map(|(idx, _)| idx).collect();
        assert_eq!(pre, vec![ids[0], ids[1], ids[4], ids[2], ids[3], ids[5], ids[6]]);
        let post: Vec<NodeId> = tree.iter_postorder().map(|(idx, _)| idx).collect();
        assert_eq!(post, vec![ids[4], ids[1], ids[2], ids[5], ids[6], ids[3], ids[0]]);
    }

    #[test]
    fn test_reparent_root_under_detached_node_moves_designated_root() {
        let (mut tree, ids) = sample();
        let other = tree.insert_node("other", 9, None).unwrap();
        assert_eq!(tree.root(), Some(ids[0]));
        tree.set_parent(ids[0], Some(other)).unwrap();
        assert_eq!(tree.root(), Some(other));
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let (mut tree, ids) = sample();
        assert_eq!(tree.remove_subtree(ids[3]).unwrap(), 3);
        assert_eq!(tree.children(ids[0]), &[ids[1], ids[2]]);
        assert!(!tree.contains(ids[5]));
        assert!(tree.node(ids[6]).is_err());
        assert_eq!(tree.depth(), 3);
    }
}
