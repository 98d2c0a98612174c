//! Convenience result type alias for AssetHub.

use crate::error::AppError;

/// A specialized `Result` type for fallible AssetHub calls.
pub type AppResult<T> = Result<T, AppError>;
