// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown queue variant: {0}")]
    UnknownVariant(String),

    #[error("Invalid queue identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid {variant} payload: {reason}")]
    InvalidPayload { variant: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
