//! # assethub-storage
//!
//! Storage backends for AssetHub. A [`StorageBackend`] pairs a byte-level
//! provider (local disk, S3-compatible object store, staging area) with
//! the folder and asset index, and the [`BackendRegistry`] routes each
//! operation to the backend that owns the folder or file.

pub mod backend;
pub mod media;
pub mod providers;
pub mod registry;
pub mod scratch;

pub use backend::{SourceBackend, StorageBackend, Upload};
pub use registry::BackendRegistry;
pub use scratch::{ScratchArea, ScratchCopy};
