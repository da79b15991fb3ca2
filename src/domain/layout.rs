//! Additive-width top-down layout.
//!
//! Every leaf occupies one horizontal unit and every inner node is as wide as
//! the sum of its children. Siblings are never compacted.

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::geometry::{layout_point, LayoutPoint};

/// One visited node of a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNode {
    pub node: NodeId,
    /// Parent at layout time; None for the laid-out root
    pub parent: Option<NodeId>,
    /// None means "not drawable", which is distinct from the origin
    pub pos: Option<LayoutPoint>,
}

/// Unscaled positions, one entry per visited node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGraph {
    nodes: Vec<RawNode>,
}

impl RawGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId, parent: Option<NodeId>, pos: Option<LayoutPoint>) {
        self.nodes.push(RawNode { node, parent, pos });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&RawNode> {
        self.nodes.iter().find(|raw| raw.node == node)
    }

    pub fn pos(&self, node: NodeId) -> Option<LayoutPoint> {
        self.get(node).and_then(|raw| raw.pos)
    }
}

impl FromIterator<RawNode> for RawGraph {
    fn from_iter<I: IntoIterator<Item = RawNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RawGraph {
    type Item = &'a RawNode;
    type IntoIter = std::slice::Iter<'a, RawNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Subtree widths filled bottom-up in a single post-order pass.
#[derive(Debug, Clone, Default)]
pub struct SubtreeWidths(HashMap<NodeId, usize>);

impl SubtreeWidths {
    pub fn compute<T>(tree: &TreeArena<T>, root: NodeId) -> Self {
        let mut widths = HashMap::new();
        for (idx, node) in tree.postorder_from(root) {
            let width = if node.is_leaf() {
                1
            } else {
                node.children()
                    .iter()
                    .map(|child| widths.get(child).copied().unwrap_or(1))
                    .sum()
            };
            widths.insert(idx, width);
        }
        Self(widths)
    }

    pub fn get(&self, node: NodeId) -> Option<usize> {
        self.0.get(&node).copied()
    }
}

/// Lays out the subtree at `root`: root at depth 0, depth growing toward leaves.
#[instrument(level = "debug", skip(tree))]
pub fn layout<T>(tree: &TreeArena<T>, root: NodeId) -> DomainResult<RawGraph> {
    if !tree.contains(root) {
        return Err(DomainError::InvalidNode(root));
    }
    let widths = SubtreeWidths::compute(tree, root);
    let mut raw = RawGraph::new();
    place(tree, &widths, root, None, 0.0, 0, &mut raw);
    Ok(raw)
}

fn place<T>(
    tree: &TreeArena<T>,
    widths: &SubtreeWidths,
    node: NodeId,
    parent: Option<NodeId>,
    offset: f64,
    depth: usize,
    raw: &mut RawGraph,
) {
    let width = widths.get(node).unwrap_or(1) as f64;
    raw.push(
        node,
        parent,
        Some(layout_point(offset + width / 2.0, depth as f64)),
    );

    let mut cursor = offset;
    for &child in tree.children(node) {
        place(tree, widths, child, Some(node), cursor, depth + 1, raw);
        cursor += widths.get(child).unwrap_or(1) as f64;
    }
}
