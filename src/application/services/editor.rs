//! Headless editing session
//!
//! Owns a tree, its options and the graph of its current layout. Every edit
//! re-sorts the tree when the `tree.sort` option is on and regenerates the
//! graph, keeping the previous one so the change can be animated.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::application::services::document::{LoadedDocument, Payload};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Options;
use crate::domain::{assign_keys, generate, transition, Graph, NodeId, TreeArena};

pub struct EditorSession {
    tree: TreeArena<Payload>,
    root: NodeId,
    options: Options,
    graph: Graph,
    previous: Option<Graph>,
}

impl EditorSession {
    pub fn new(mut tree: TreeArena<Payload>, root: NodeId, options: Options) -> ApplicationResult<Self> {
        if options.tree.sort {
            tree.sort_recursive(root)?;
        }
        let graph = generate(&tree, root, options.graph.to_graph_config())?;
        Ok(Self {
            tree,
            root,
            options,
            graph,
            previous: None,
        })
    }

    pub fn open(doc: LoadedDocument) -> ApplicationResult<Self> {
        Self::new(doc.tree, doc.root, doc.options)
    }

    pub fn tree(&self) -> &TreeArena<Payload> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Graph of the current tree.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Graph before the last edit, if any.
    pub fn previous(&self) -> Option<&Graph> {
        self.previous.as_ref()
    }

    /// Document key of every node.
    pub fn keys(&self) -> BTreeMap<String, NodeId> {
        assign_keys(&self.tree, self.root)
            .into_iter()
            .map(|(idx, key)| (key, idx))
            .collect()
    }

    /// Document key per node, for labelling output.
    pub fn labels(&self) -> BTreeMap<NodeId, String> {
        assign_keys(&self.tree, self.root).into_iter().collect()
    }

    pub fn resolve(&self, key: &str) -> ApplicationResult<NodeId> {
        self.keys()
            .get(key)
            .copied()
            .ok_or_else(|| ApplicationError::UnknownKey(key.to_string()))
    }

    #[instrument(level = "debug", skip(self, data))]
    pub fn add_child(&mut self, parent: NodeId, id: &str, data: Payload) -> ApplicationResult<NodeId> {
        let node = self.tree.insert_node(id, data, Some(parent))?;
        self.refresh()?;
        Ok(node)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, node: NodeId, id: &str) -> ApplicationResult<()> {
        self.tree.rename(node, id)?;
        self.refresh()
    }

    /// Reparents `node`; a cycle is rejected and leaves the session unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, node: NodeId, parent: NodeId) -> ApplicationResult<()> {
        self.tree.set_parent(node, Some(parent))?;
        self.refresh()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, node: NodeId) -> ApplicationResult<usize> {
        if node == self.root {
            return Err(ApplicationError::InvalidEdit(
                "the root node can not be removed".to_string(),
            ));
        }
        let removed = self.tree.remove_subtree(node)?;
        self.refresh()?;
        Ok(removed)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn sort(&mut self, node: NodeId, recursive: bool) -> ApplicationResult<()> {
        if recursive {
            self.tree.sort_recursive(node)?;
        } else {
            self.tree.sort(node)?;
        }
        self.refresh()
    }

    /// Validates and stores an option, then re-lays out with it.
    #[instrument(level = "debug", skip(self))]
    pub fn set_option(&mut self, key: &str, value: &str) -> ApplicationResult<()> {
        self.options.set(key, value)?;
        self.refresh()
    }

    fn refresh(&mut self) -> ApplicationResult<()> {
        if self.options.tree.sort {
            self.tree.sort_recursive(self.root)?;
        }
        let graph = generate(&self.tree, self.root, self.options.graph.to_graph_config())?;
        self.previous = Some(std::mem::replace(&mut self.graph, graph));
        debug!("Regenerated graph with {} nodes", self.graph.len());
        Ok(())
    }

    /// Animation of the last edit: `steps` graphs ending with the current one.
    ///
    /// Without a previous graph this is just the current graph.
    pub fn frames(&self, steps: u32) -> Vec<Graph> {
        let Some(previous) = &self.previous else {
            return vec![self.graph.clone()];
        };
        let steps = steps.max(1);
        let mut frames: Vec<Graph> = (1..steps)
            .map(|step| transition(previous, &self.graph, f64::from(step) / f64::from(steps)))
            .collect();
        frames.push(self.graph.clone());
        frames
    }

    pub fn into_parts(self) -> (TreeArena<Payload>, NodeId, Options) {
        (self.tree, self.root, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    fn session() -> (EditorSession, NodeId) {
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", Payload::Null, None).unwrap();
        let child = tree.insert_node("b", Payload::Null, Some(root)).unwrap();
        (EditorSession::new(tree, root, Options::default()).unwrap(), child)
    }

    #[test]
    fn test_cycle_keeps_session_unchanged() {
        let (mut session, child) = session();
        let root = session.root();
        let before = session.tree().children(root).to_vec();
        let err = session.move_node(root, child).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::CircularTree { .. })
        ));
        assert_eq!(session.tree().children(root), before.as_slice());
        assert!(session.previous().is_none());
    }

    #[test]
    fn test_sort_option_orders_new_children() {
        let (mut session, _) = session();
        let root = session.root();
        session.set_option("tree.sort", "true").unwrap();
        session.add_child(root, "a", Payload::Null).unwrap();
        let ids: Vec<&str> = session
            .tree()
            .children(root)
            .iter()
            .map(|&idx| session.tree().node(idx).unwrap().id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_frames_end_with_current_graph() {
        let (mut session, _) = session();
        assert_eq!(session.frames(20).len(), 1);
        let root = session.root();
        let added = session.add_child(root, "c", Payload::Null).unwrap();
        let frames = session.frames(4);
        assert_eq!(frames.len(), 4);
        let last = frames.last().unwrap();
        assert_eq!(last.pos(added).unwrap(), session.graph().pos(added).unwrap());
    }

    #[test]
    fn test_root_can_not_be_removed() {
        let (mut session, child) = session();
        assert!(session.remove(session.root()).is_err());
        assert_eq!(session.remove(child).unwrap(), 1);
        assert_eq!(session.tree().len(), 1);
    }
}
