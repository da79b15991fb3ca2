//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add option, config and persistence context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Validation {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("no node with key '{0}' in document")]
    UnknownKey(String),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("malformed document: {message}")]
    Document { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
