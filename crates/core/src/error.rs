// Central Error Type for the Application

use crate::domain::{QueueIdentity, VariantTag};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No queue in {0}")]
    NotFound(QueueIdentity),

    #[error("A queue already exists in {0}")]
    AlreadyExists(QueueIdentity),

    #[error("Queue {identity} is a {actual} queue; {operation} needs {expected}")]
    WrongVariant {
        identity: QueueIdentity,
        operation: &'static str,
        expected: &'static str,
        actual: VariantTag,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
