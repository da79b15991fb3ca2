//! yggdraw: single-parent trees with a typed arena, a width-based layout and
//! pixel graphs that can be scaled and animated between edits.
//!
//! Layers:
//! - `domain`: tree model, layout, graph geometry, keyed documents
//! - `application`: document persistence and editing sessions
//! - `infrastructure`: filesystem, export capabilities, service wiring
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{ApplicationError, ApplicationResult};
pub use domain::{DomainError, DomainResult, Graph, NodeId, TreeArena};
