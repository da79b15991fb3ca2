//! Text rendering of a tree through `termtree`.

use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{NodeId, TreeArena};

pub trait TreeNodeConvert {
    /// Tree of display labels rooted at the designated root.
    fn to_tree_string(&self) -> Tree<String>;

    /// Tree of labels produced by `label` for the subtree at `node`.
    fn subtree_string(&self, node: NodeId, label: &dyn Fn(NodeId) -> String) -> Tree<String>;
}

impl<T> TreeNodeConvert for TreeArena<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        match self.root() {
            Some(root) => self.subtree_string(root, &|idx| {
                self.get_node(idx)
                    .map(|node| node.id.clone())
                    .unwrap_or_default()
            }),
            None => Tree::new("Empty tree".to_string()),
        }
    }

    fn subtree_string(&self, node: NodeId, label: &dyn Fn(NodeId) -> String) -> Tree<String> {
        let leaves: Vec<_> = self
            .children(node)
            .iter()
            .map(|&child| self.subtree_string(child, label))
            .collect();
        Tree::new(label(node)).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tree_string_renders_children_in_order() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", (), None).unwrap();
        let child = tree.insert_node("child1", (), Some(root)).unwrap();
        tree.insert_node("grandchild1", (), Some(child)).unwrap();
        tree.insert_node("child2", (), Some(root)).unwrap();

        let rendered = tree.to_tree_string().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "root");
        assert!(lines[1].ends_with("child1"));
        assert!(lines[2].ends_with("grandchild1"));
        assert!(lines[3].ends_with("child2"));
    }
}
