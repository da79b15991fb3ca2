//! Keyed document format for persisting a tree with its options.
//!
//! Display ids may repeat while editing, so each node gets a document key:
//! its id on first use, otherwise `"<id> {{{n}}}"` with the smallest unused
//! `n` counting from 0. Loading strips that suffix again. Ids that were
//! duplicates come back as they were displayed, which means a document can
//! not tell an original id `"a {{{0}}}"` apart from a disambiguated `"a"`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::error::DomainResult;
use crate::domain::structured::{build_structure, parse_structure, Structure};

/// Anchored disambiguation suffix: `" {{{"`, decimal digits, `"}}}"` at end of string.
/// The id part may span lines.
pub const SUFFIX_PATTERN: &str = r"(?s)^(.*) \{\{\{\d+\}\}\}$";

static SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SUFFIX_PATTERN).expect("suffix pattern is a valid regex"));

/// Persisted form of a tree: payloads by key, nested structure, options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document<T, O> {
    pub data: BTreeMap<String, T>,
    pub structure: Structure,
    pub options: O,
}

/// Display id of a document key.
pub fn strip_suffix(key: &str) -> &str {
    SUFFIX
        .captures(key)
        .and_then(|caps| caps.get(1))
        .map_or(key, |id| id.as_str())
}

/// First key for `id` not contained in `used`.
pub fn disambiguate(id: &str, used: &HashSet<String>) -> String {
    let mut key = id.to_string();
    let mut num = 0u64;
    while used.contains(&key) {
        key = format!("{} {{{{{{{}}}}}}}", id, num);
        num += 1;
    }
    key
}

/// Document keys of the subtree at `root`, in unroll order.
pub fn assign_keys<T>(tree: &TreeArena<T>, root: NodeId) -> Vec<(NodeId, String)> {
    let mut used = HashSet::new();
    let mut keys = Vec::new();
    for idx in tree.unroll(root) {
        let Some(node) = tree.get_node(idx) else {
            continue;
        };
        let key = disambiguate(&node.id, &used);
        if key != node.id {
            debug!("Disambiguated '{}' as '{}'", node.id, key);
        }
        used.insert(key.clone());
        keys.push((idx, key));
    }
    keys
}

#[instrument(level = "debug", skip(tree, options))]
pub fn to_document<T: Clone, O>(
    tree: &TreeArena<T>,
    root: NodeId,
    options: O,
) -> DomainResult<Document<T, O>> {
    tree.node(root)?;
    let keys: HashMap<NodeId, String> = assign_keys(tree, root).into_iter().collect();
    let mut data = BTreeMap::new();
    for (idx, key) in &keys {
        data.insert(key.clone(), tree.node(*idx)?.data.clone());
    }
    Ok(Document {
        data,
        structure: build_structure(tree, root, &keys),
        options,
    })
}

/// Rebuilds the tree of `doc`. Returns the arena, its root and the options.
#[instrument(level = "debug", skip_all)]
pub fn from_document<T, O>(doc: Document<T, O>) -> DomainResult<(TreeArena<T>, NodeId, O)> {
    let Document {
        data,
        structure,
        options,
    } = doc;
    let (tree, root) = parse_structure(&structure, data, strip_suffix)?;
    Ok((tree, root, options))
}
