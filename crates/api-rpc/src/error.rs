//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use eduqueue_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const WRONG_VARIANT: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const PERSISTENCE_ERROR: i32 = 5001;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Validation(_) | AppError::Domain(_) => code::VALIDATION_ERROR,
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::AlreadyExists(_) => code::CONFLICT,
        AppError::WrongVariant { .. } => code::WRONG_VARIANT,
        AppError::Persistence(_) | AppError::Io(_) | AppError::Serialization(_) => {
            code::PERSISTENCE_ERROR
        }
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}
