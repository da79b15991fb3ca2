//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Domain errors represent violations of the tree and graph invariants.
/// A failed operation never leaves the tree partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("circular tree: {parent} is {node} or one of its descendants")]
    CircularTree { node: NodeId, parent: NodeId },

    #[error("malformed tree structure: {reason}")]
    Parse { reason: String },

    #[error("node not found in graph: {0}")]
    NodeNotFound(NodeId),

    #[error("node does not exist in tree: {0}")]
    InvalidNode(NodeId),
}

impl DomainError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
