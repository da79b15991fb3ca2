//! Domain layer: tree model, layout, presentation geometry, serialization
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod structured;
pub mod tree_traits;

pub use arena::{NodeId, TreeArena, TreeNode};
pub use document::{assign_keys, from_document, strip_suffix, to_document, Document};
pub use error::{DomainError, DomainResult};
pub use geometry::{LayoutPoint, PixelPoint};
pub use graph::{generate, transition, Graph, GraphBuilder, GraphConfig, PlacedNode};
pub use layout::{layout, RawGraph, RawNode, SubtreeWidths};
pub use structured::{from_structured, to_structured, Structure};
pub use tree_traits::TreeNodeConvert;
