//! Conversion between a tree and a (data, structure) pair.
//!
//! The structure of a node is a single-key object `{ key: [child structures] }`,
//! the data map holds one payload per key.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::error::{DomainError, DomainResult};

/// Nested single-root structure: `{ key: [Structure, ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Structure(BTreeMap<String, Vec<Structure>>);

impl Structure {
    pub fn new(key: impl Into<String>, children: Vec<Structure>) -> Self {
        Self(BTreeMap::from([(key.into(), children)]))
    }

    /// The key and children of this level; fails unless there is exactly one key.
    pub fn single(&self) -> DomainResult<(&str, &[Structure])> {
        let mut entries = self.0.iter();
        match (entries.next(), entries.next()) {
            (Some((key, children)), None) => Ok((key.as_str(), children.as_slice())),
            (None, _) => Err(DomainError::parse("structure level without a key")),
            (Some(_), Some(_)) => Err(DomainError::parse(format!(
                "structure level with {} keys, expected exactly one",
                self.0.len()
            ))),
        }
    }

    /// Number of levels from this one down to the deepest leaf.
    pub fn depth(&self) -> usize {
        1 + self
            .0
            .values()
            .flatten()
            .map(Structure::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Splits the subtree at `root` into payloads keyed by display id and its structure.
///
/// Display ids must be unique for a lossless round trip; use the keyed
/// document format when they are not.
#[instrument(level = "debug", skip(tree))]
pub fn to_structured<T: Clone>(
    tree: &TreeArena<T>,
    root: NodeId,
) -> DomainResult<(BTreeMap<String, T>, Structure)> {
    tree.node(root)?;
    let mut keys = HashMap::new();
    let mut data = BTreeMap::new();
    for idx in tree.unroll(root) {
        let node = tree.node(idx)?;
        keys.insert(idx, node.id.clone());
        data.insert(node.id.clone(), node.data.clone());
    }
    Ok((data, build_structure(tree, root, &keys)))
}

/// Rebuilds a tree from a data map and structure produced by [`to_structured`].
#[instrument(level = "debug", skip_all)]
pub fn from_structured<T>(
    data: BTreeMap<String, T>,
    structure: &Structure,
) -> DomainResult<(TreeArena<T>, NodeId)> {
    parse_structure(structure, data, |key| key)
}

pub(crate) fn build_structure<T>(
    tree: &TreeArena<T>,
    node: NodeId,
    keys: &HashMap<NodeId, String>,
) -> Structure {
    let children = tree
        .children(node)
        .iter()
        .map(|&child| build_structure(tree, child, keys))
        .collect();
    let key = keys.get(&node).cloned().unwrap_or_default();
    Structure::new(key, children)
}

/// Builds a fresh arena top-down from `structure`.
///
/// Each payload is consumed once, so a key appearing twice in the structure
/// is rejected. Nothing is returned on failure.
pub(crate) fn parse_structure<T>(
    structure: &Structure,
    mut data: BTreeMap<String, T>,
    label: impl Fn(&str) -> &str,
) -> DomainResult<(TreeArena<T>, NodeId)> {
    let mut tree = TreeArena::new();
    let root = attach(&mut tree, structure, &mut data, None, &label)?;
    if !data.is_empty() {
        debug!("Ignoring {} data entries without structure", data.len());
    }
    Ok((tree, root))
}

fn attach<T>(
    tree: &mut TreeArena<T>,
    structure: &Structure,
    data: &mut BTreeMap<String, T>,
    parent: Option<NodeId>,
    label: &impl Fn(&str) -> &str,
) -> DomainResult<NodeId> {
    let (key, children) = structure.single()?;
    let payload = data
        .remove(key)
        .ok_or_else(|| DomainError::parse(format!("no data for key '{}'", key)))?;
    let node = tree.insert_node(label(key), payload, parent)?;
    for child in children {
        attach(tree, child, data, Some(node), label)?;
    }
    Ok(node)
}
