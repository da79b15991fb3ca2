//! Error conversion helpers for document I/O
//!
//! Extension traits attaching the document path to I/O and codec failures.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(path).with_path_context("read document", path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait turning encoder/decoder errors into `Document` errors.
pub trait CodecResultExt<T> {
    fn with_document_context(self, path: &Path) -> ApplicationResult<T>;
}

impl<T, E: std::fmt::Display> CodecResultExt<T> for Result<T, E> {
    fn with_document_context(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Document {
            message: format!("{}: {}", path.display(), e),
        })
    }
}
