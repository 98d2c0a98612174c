//! # assethub-database
//!
//! Persistence for the folder and asset index: the repository traits the
//! index layer is written against, a PostgreSQL implementation, and an
//! in-memory implementation. Both hand out owned transaction handles.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repositories::{
    AssetRepository, AssetStore, FolderRepository, StoreTransaction, TransactionScope,
};
