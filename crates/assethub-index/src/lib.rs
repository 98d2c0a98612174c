//! # assethub-index
//!
//! Query layer over the persisted folder and asset tables. [`FolderIndex`]
//! caches folder lookups (hits and misses) in a moka TTL cache and builds
//! folder trees; [`AssetIndex`] validates and writes asset rows.

pub mod asset;
pub mod folder;

pub use asset::{AssetIndex, Uniqueness};
pub use folder::FolderIndex;
