//! Tests for the arena tree model: ancestry, reparenting, traversal order

use std::collections::HashMap;

use rstest::{fixture, rstest};

use yggdraw::domain::{DomainError, NodeId, TreeArena};
use yggdraw::util::testing;

/// root -> [A, B, C], A -> [D], C -> [E, F]
struct Sample {
    tree: TreeArena<u32>,
    ids: HashMap<&'static str, NodeId>,
}

impl Sample {
    fn id(&self, name: &str) -> NodeId {
        self.ids[name]
    }

    fn names(&self, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&idx| self.tree.node(idx).unwrap().id.clone())
            .collect()
    }

    fn snapshot(&self) -> Vec<(NodeId, Vec<NodeId>)> {
        self.tree
            .iter()
            .map(|(idx, node)| (idx, node.children().to_vec()))
            .collect()
    }
}

#[fixture]
fn sample() -> Sample {
    testing::init_test_setup();
    let mut tree = TreeArena::new();
    let mut ids = HashMap::new();
    let root = tree.insert_node("root", 0, None).unwrap();
    ids.insert("root", root);
    for (name, parent, data) in [
        ("A", "root", 1),
        ("B", "root", 2),
        ("C", "root", 3),
        ("D", "A", 4),
        ("E", "C", 5),
        ("F", "C", 6),
    ] {
        let idx = tree.insert_node(name, data, Some(ids[parent])).unwrap();
        ids.insert(name, idx);
    }
    Sample { tree, ids }
}

// ============================================================
// Ancestry
// ============================================================

#[rstest]
fn given_any_node_when_checking_itself_then_is_not_own_ancestor(sample: Sample) {
    for (idx, _) in sample.tree.iter() {
        assert!(!sample.tree.has_ancestor(idx, idx));
    }
}

#[rstest]
#[case("D", "A", true)]
#[case("D", "root", true)]
#[case("E", "A", false)]
#[case("root", "D", false)]
fn given_node_when_checking_ancestor_then_follows_parent_chain(
    sample: Sample,
    #[case] node: &str,
    #[case] candidate: &str,
    #[case] expected: bool,
) {
    assert_eq!(
        sample.tree.has_ancestor(sample.id(node), sample.id(candidate)),
        expected
    );
}

// ============================================================
// Reparenting
// ============================================================

#[rstest]
#[case("root", "D")]
#[case("A", "D")]
#[case("C", "F")]
#[case("C", "C")]
fn given_descendant_as_parent_when_reparenting_then_rejects_and_keeps_children(
    mut sample: Sample,
    #[case] node: &str,
    #[case] new_parent: &str,
) {
    // Arrange
    let before = sample.snapshot();

    // Act
    let result = sample
        .tree
        .set_parent(sample.id(node), Some(sample.id(new_parent)));

    // Assert
    assert!(matches!(result, Err(DomainError::CircularTree { .. })));
    assert_eq!(sample.snapshot(), before);
}

#[rstest]
fn given_valid_parent_when_reparenting_then_moves_to_end_of_children(mut sample: Sample) {
    let (d, c) = (sample.id("D"), sample.id("C"));

    sample.tree.set_parent(d, Some(c)).unwrap();

    assert_eq!(sample.tree.parent(d), Some(c));
    assert!(sample.tree.children(sample.id("A")).is_empty());
    assert_eq!(sample.names(sample.tree.children(c)), vec!["E", "F", "D"]);
}

#[rstest]
fn given_same_parent_when_reparenting_then_moves_to_end(mut sample: Sample) {
    let root = sample.id("root");

    sample.tree.set_parent(sample.id("A"), Some(root)).unwrap();

    assert_eq!(sample.names(sample.tree.children(root)), vec!["B", "C", "A"]);
}

#[rstest]
fn given_detached_node_when_reparenting_to_none_then_becomes_standalone(mut sample: Sample) {
    let c = sample.id("C");

    sample.tree.set_parent(c, None).unwrap();

    assert_eq!(sample.tree.parent(c), None);
    assert_eq!(sample.names(sample.tree.children(sample.id("root"))), vec!["A", "B"]);
    assert_eq!(sample.names(&sample.tree.unroll(c)), vec!["C", "E", "F"]);
}

// ============================================================
// Traversal
// ============================================================

#[rstest]
fn given_sample_tree_when_unrolling_then_yields_two_phase_order(sample: Sample) {
    let order = sample.tree.unroll(sample.id("root"));

    assert_eq!(
        sample.names(&order),
        vec!["root", "A", "B", "C", "D", "E", "F"]
    );
}

#[rstest]
fn given_deeper_tree_when_unrolling_then_each_node_once(mut sample: Sample) {
    let d = sample.id("D");
    let g = sample.tree.insert_node("G", 7, Some(d)).unwrap();
    sample.tree.insert_node("H", 8, Some(g)).unwrap();

    let order = sample.tree.unroll(sample.id("root"));

    assert_eq!(order.len(), sample.tree.len());
    assert_eq!(
        sample.names(&order),
        vec!["root", "A", "B", "C", "D", "E", "F", "G", "H"]
    );
}

#[rstest]
fn given_sample_tree_when_iterating_postorder_then_children_come_first(sample: Sample) {
    let order: Vec<NodeId> = sample.tree.iter_postorder().map(|(idx, _)| idx).collect();

    assert_eq!(
        sample.names(&order),
        vec!["D", "A", "B", "E", "F", "C", "root"]
    );
}

#[rstest]
fn given_sample_tree_when_querying_shape_then_reports_depth_and_leaves(sample: Sample) {
    assert_eq!(sample.tree.depth(), 3);
    assert_eq!(sample.names(&sample.tree.leaf_nodes()), vec!["D", "B", "E", "F"]);
}

// ============================================================
// Sorting and removal
// ============================================================

#[rstest]
fn given_unsorted_children_when_sorting_recursively_then_orders_by_id(mut sample: Sample) {
    let root = sample.id("root");
    sample.tree.rename(sample.id("A"), "z").unwrap();
    sample.tree.rename(sample.id("F"), "a").unwrap();

    sample.tree.sort_recursive(root).unwrap();

    assert_eq!(sample.names(sample.tree.children(root)), vec!["B", "C", "z"]);
    assert_eq!(sample.names(sample.tree.children(sample.id("C"))), vec!["E", "a"]);
}

#[rstest]
fn given_tied_custom_key_when_sorting_then_display_id_breaks_tie_without_recursing(
    mut sample: Sample,
) {
    // Arrange: A (odd) renamed past C (odd), E and F swapped out of id order
    let (root, c) = (sample.id("root"), sample.id("C"));
    sample.tree.rename(sample.id("A"), "x").unwrap();
    sample.tree.rename(sample.id("E"), "z").unwrap();

    // Act
    sample.tree.sort_by_key(root, |node| node.data % 2).unwrap();

    // Assert
    assert_eq!(sample.names(sample.tree.children(root)), vec!["B", "C", "x"]);
    assert_eq!(sample.names(sample.tree.children(c)), vec!["z", "F"]);
}

#[rstest]
fn given_subtree_when_removing_then_handles_go_stale(mut sample: Sample) {
    let (c, e) = (sample.id("C"), sample.id("E"));

    let removed = sample.tree.remove_subtree(c).unwrap();

    assert_eq!(removed, 3);
    assert_eq!(sample.tree.len(), 4);
    assert!(!sample.tree.contains(e));
    assert!(matches!(sample.tree.node(e), Err(DomainError::InvalidNode(_))));
}
