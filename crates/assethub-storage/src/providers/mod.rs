//! Byte-level storage providers.

pub mod local;
pub mod object;
#[cfg(feature = "s3")]
pub mod s3;

pub use local::LocalStorageProvider;
pub use object::{MemoryObjectClient, ObjectClient, ObjectStoreProvider};
