//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod document;
mod editor;

pub use document::{DocumentFormat, DocumentService, LoadedDocument, Payload, StoredDocument};
pub use editor::EditorSession;
