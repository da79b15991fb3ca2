//! Pixel-space presentation of a layout.
//!
//! A [`Graph`] is an immutable snapshot: it records node positions and parent
//! links at generation time and never looks at the live tree again. Regenerate
//! it after every edit.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::{instrument, trace};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::geometry::{
    direction, polar, rotate, LayoutPoint, LayoutToPixel, PixelBox, PixelPoint, PixelVector,
};
use crate::domain::layout::{layout, RawGraph, RawNode};

/// Drawing parameters of a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    pub radius: f64,
    pub padding: f64,
    pub arrow_length: f64,
    pub arrow_width: f64,
    /// Shift positions so the bounding box starts at the origin
    pub normalize: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            radius: 40.0,
            padding: 5.0,
            arrow_length: 5.0,
            arrow_width: 5.0,
            normalize: true,
        }
    }
}

impl GraphConfig {
    /// Pixels per layout unit: one node diameter plus padding on both sides.
    pub fn scalar(&self) -> f64 {
        2.0 * (self.radius + self.padding)
    }

    /// Every length multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            radius: self.radius * factor,
            padding: self.padding * factor,
            arrow_length: self.arrow_length * factor,
            arrow_width: self.arrow_width * factor,
            normalize: self.normalize,
        }
    }
}

/// A node of a graph snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNode {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    pub pos: Option<PixelPoint>,
}

/// Builds a [`Graph`] from a [`RawGraph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    config: GraphConfig,
    prescaled: bool,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            prescaled: false,
        }
    }

    /// Treat raw positions as pixel positions instead of multiplying by the scalar.
    pub fn prescaled(mut self, prescaled: bool) -> Self {
        self.prescaled = prescaled;
        self
    }

    pub fn build(&self, raw: &RawGraph) -> Graph {
        let scalar = self.config.scalar();
        let scale = LayoutToPixel::new(if self.prescaled { 1.0 } else { scalar });

        let mut nodes: Vec<PlacedNode> = raw
            .iter()
            .map(|raw_node| PlacedNode {
                node: raw_node.node,
                parent: raw_node.parent,
                pos: raw_node.pos.map(|pos| pos * scale),
            })
            .collect();

        let drawable: Vec<PixelPoint> = nodes.iter().filter_map(|placed| placed.pos).collect();
        let mut bounds = if drawable.is_empty() {
            PixelBox::zero()
        } else {
            let half = 0.5 * scalar;
            PixelBox::from_points(&drawable).inflate(half, half)
        };

        if self.config.normalize {
            let shift = -bounds.min.to_vector();
            for pos in nodes.iter_mut().filter_map(|placed| placed.pos.as_mut()) {
                *pos += shift;
            }
            bounds = bounds.translate(shift);
        }

        let index = nodes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, placed)| (placed.node, i))
            .collect();

        Graph {
            config: self.config,
            nodes,
            index,
            bounds,
        }
    }
}

/// Scaled, optionally normalized, immutable presentation of a layout.
#[derive(Debug, Clone)]
pub struct Graph {
    config: GraphConfig,
    nodes: Vec<PlacedNode>,
    index: HashMap<NodeId, usize>,
    bounds: PixelBox,
}

/// Lays out the subtree at `root` and turns it into a graph.
#[instrument(level = "debug", skip(tree))]
pub fn generate<T>(tree: &TreeArena<T>, root: NodeId, config: GraphConfig) -> DomainResult<Graph> {
    let raw = layout(tree, root)?;
    Ok(Graph::new(&raw, config))
}

impl Graph {
    pub fn new(raw: &RawGraph, config: GraphConfig) -> Self {
        GraphBuilder::new(config).build(raw)
    }

    pub fn config(&self) -> GraphConfig {
        self.config
    }

    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    pub fn padding(&self) -> f64 {
        self.config.padding
    }

    pub fn arrow_length(&self) -> f64 {
        self.config.arrow_length
    }

    pub fn arrow_width(&self) -> f64 {
        self.config.arrow_width
    }

    pub fn scalar(&self) -> f64 {
        self.config.scalar()
    }

    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }

    /// Box containing every drawable node's footprint.
    pub fn bounds(&self) -> PixelBox {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    /// Every node of the snapshot exactly once.
    pub fn iter(&self) -> std::slice::Iter<'_, PlacedNode> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|placed| placed.node)
    }

    /// Nodes with a position, paired with it.
    pub fn drawable(&self) -> impl Iterator<Item = (NodeId, PixelPoint)> + '_ {
        self.nodes
            .iter()
            .filter_map(|placed| placed.pos.map(|pos| (placed.node, pos)))
    }

    fn placed(&self, node: NodeId) -> Option<&PlacedNode> {
        self.index.get(&node).and_then(|&i| self.nodes.get(i))
    }

    /// Pixel position of `node`; `Ok(None)` when it is not drawable.
    pub fn pos(&self, node: NodeId) -> DomainResult<Option<PixelPoint>> {
        self.placed(node)
            .map(|placed| placed.pos)
            .ok_or(DomainError::NodeNotFound(node))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.placed(node).and_then(|placed| placed.parent)
    }

    /// Positions of `node` and its parent when both are drawable.
    fn endpoints(&self, node: NodeId) -> Option<(PixelPoint, PixelPoint)> {
        let placed = self.placed(node)?;
        let parent = self.placed(placed.parent?)?;
        Some((placed.pos?, parent.pos?))
    }

    pub fn has_line(&self, node: NodeId) -> bool {
        self.endpoints(node).is_some()
    }

    /// Angle of the connector from `node` toward its parent.
    pub fn line_direction(&self, node: NodeId) -> Option<f64> {
        self.endpoints(node).map(|(from, to)| direction(from, to))
    }

    /// Connector start on the boundary of `node`'s circle.
    pub fn line_start(&self, node: NodeId) -> Option<PixelPoint> {
        let (from, to) = self.endpoints(node)?;
        Some(from + polar(direction(from, to), self.config.radius))
    }

    /// Connector end on the boundary of the parent's circle.
    pub fn line_end(&self, node: NodeId) -> Option<PixelPoint> {
        let (from, to) = self.endpoints(node)?;
        Some(to - polar(direction(from, to), self.config.radius))
    }

    /// Arrowhead triangle at the parent end: tip first, then the two back corners.
    pub fn arrow_points(&self, node: NodeId) -> Option<[PixelPoint; 3]> {
        let angle = self.line_direction(node)?;
        let end = self.line_end(node)?;
        let back = -self.config.arrow_length;
        let half_width = self.config.arrow_width / 2.0;
        let template = [
            PixelVector::zero(),
            PixelVector::new(back, half_width),
            PixelVector::new(back, -half_width),
        ];
        Some(template.map(|corner| end + rotate(corner, angle)))
    }

    /// Unscaled positions: every pixel position divided by the scalar.
    pub fn raw(&self) -> RawGraph {
        let scale = LayoutToPixel::new(self.config.scalar());
        self.nodes
            .iter()
            .map(|placed| RawNode {
                node: placed.node,
                parent: placed.parent,
                pos: placed.pos.map(|pos| pos / scale),
            })
            .collect()
    }

    /// New graph with every length multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Graph {
        Graph::new(&self.raw(), self.config.scaled(factor))
    }
}

/// Linear interpolation between two snapshots, carrying `to`'s configuration.
///
/// Covers the union of both node sets. A node missing (or not drawable) on
/// one side borrows the position of its nearest ancestor on that side; with
/// no such ancestor the other side's position is used as is.
#[instrument(level = "trace", skip(from, to))]
pub fn transition(from: &Graph, to: &Graph, weight: f64) -> Graph {
    let weight = weight.clamp(0.0, 1.0);
    let raw_from = from.raw();
    let raw_to = to.raw();

    let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    for raw_node in raw_to.iter().chain(raw_from.iter()) {
        parents.entry(raw_node.node).or_insert(raw_node.parent);
    }
    let from_pos = positions(&raw_from);
    let to_pos = positions(&raw_to);

    let raw: RawGraph = raw_from
        .iter()
        .chain(raw_to.iter())
        .unique_by(|raw_node| raw_node.node)
        .map(|raw_node| {
            let start = resolve(&from_pos, &parents, raw_node.node);
            let end = resolve(&to_pos, &parents, raw_node.node);
            let pos = match (start, end) {
                (Some(start), Some(end)) => Some(start.lerp(end, weight)),
                (start, end) => start.or(end),
            };
            RawNode {
                node: raw_node.node,
                parent: parents.get(&raw_node.node).copied().flatten(),
                pos,
            }
        })
        .collect();

    trace!("Interpolated {} nodes", raw.len());
    Graph::new(&raw, to.config())
}

fn positions(raw: &RawGraph) -> HashMap<NodeId, LayoutPoint> {
    raw.iter()
        .filter_map(|raw_node| raw_node.pos.map(|pos| (raw_node.node, pos)))
        .collect()
}

/// Position of `node`, or of its nearest ancestor that has one.
fn resolve(
    positions: &HashMap<NodeId, LayoutPoint>,
    parents: &HashMap<NodeId, Option<NodeId>>,
    node: NodeId,
) -> Option<LayoutPoint> {
    let mut current = Some(node);
    // Bounded walk: merged parent links of two snapshots are not trusted to be acyclic
    for _ in 0..=parents.len() {
        let idx = current?;
        if let Some(pos) = positions.get(&idx) {
            return Some(*pos);
        }
        current = parents.get(&idx).copied().flatten();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::{layout_point, pixel_point};

    const THRESHOLD: f64 = 1e-9;

    fn close(a: PixelPoint, b: PixelPoint) -> bool {
        (a - b).length() < THRESHOLD
    }

    fn pair() -> (NodeId, NodeId, RawGraph) {
        let mut tree = TreeArena::new();
        let parent = tree.insert_node("parent", (), None).unwrap();
        let child = tree.insert_node("child", (), Some(parent)).unwrap();
        let mut raw = RawGraph::new();
        raw.push(parent, None, Some(layout_point(0.0, 0.0)));
        raw.push(child, Some(parent), Some(layout_point(0.0, 1.0)));
        (parent, child, raw)
    }

    fn config() -> GraphConfig {
        GraphConfig {
            radius: 10.0,
            padding: 5.0,
            arrow_length: 4.0,
            arrow_width: 6.0,
            normalize: false,
        }
    }

    #[test]
    fn test_line_runs_between_circle_boundaries() {
        let (parent, child, raw) = pair();
        let graph = Graph::new(&raw, config());

        assert!(graph.has_line(child));
        assert!(!graph.has_line(parent));
        assert_eq!(graph.pos(child).unwrap(), Some(pixel_point(0.0, 30.0)));

        let angle = graph.line_direction(child).unwrap();
        assert!((angle + std::f64::consts::FRAC_PI_2).abs() < THRESHOLD);
        assert!(close(graph.line_start(child).unwrap(), pixel_point(0.0, 20.0)));
        assert!(close(graph.line_end(child).unwrap(), pixel_point(0.0, 10.0)));
    }

    #[test]
    fn test_arrow_points_toward_parent() {
        let (_, child, raw) = pair();
        let graph = Graph::new(&raw, config());
        let [tip, left, right] = graph.arrow_points(child).unwrap();

        assert!(close(tip, pixel_point(0.0, 10.0)));
        // Back corners sit arrow_length behind the tip, arrow_width apart
        assert!(close(left, pixel_point(3.0, 14.0)));
        assert!(close(right, pixel_point(-3.0, 14.0)));
    }

    #[test]
    fn test_undrawable_parent_has_no_line() {
        let (parent, child, _) = pair();
        let mut raw = RawGraph::new();
        raw.push(parent, None, None);
        raw.push(child, Some(parent), Some(layout_point(0.0, 0.0)));
        let graph = Graph::new(&raw, config());

        assert!(!graph.has_line(child));
        assert_eq!(graph.line_direction(child), None);
        assert_eq!(graph.arrow_points(child), None);
        assert_eq!(graph.pos(parent).unwrap(), None);
        assert_eq!(graph.drawable().count(), 1);
    }

    #[test]
    fn test_missing_node_is_reported() {
        let (parent, child, _) = pair();
        let mut raw = RawGraph::new();
        raw.push(parent, None, Some(layout_point(0.0, 0.0)));
        let graph = Graph::new(&raw, config());
        assert_eq!(graph.pos(child), Err(DomainError::NodeNotFound(child)));
    }

    #[test]
    fn test_new_node_grows_out_of_its_parent() {
        let (parent, child, raw_to) = pair();
        let mut raw_from = RawGraph::new();
        raw_from.push(parent, None, Some(layout_point(0.0, 0.0)));
        let from = Graph::new(&raw_from, config());
        let to = Graph::new(&raw_to, config());

        let start = transition(&from, &to, 0.0);
        assert_eq!(start.pos(child).unwrap(), start.pos(parent).unwrap());

        let halfway = transition(&from, &to, 0.5);
        assert!(close(halfway.pos(child).unwrap().unwrap(), pixel_point(0.0, 15.0)));
    }
}
