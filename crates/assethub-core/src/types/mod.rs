//! Shared value types used across AssetHub crates.

pub mod id;
pub mod operation;
pub mod param;

pub use id::*;
pub use operation::{OperationResult, OperationStatus};
