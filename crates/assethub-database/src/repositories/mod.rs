//! Repository traits for the folder and asset tables.
//!
//! The index layer only talks to these traits. Implementations decide how
//! rows are stored. Transactions are owned handles: each caller that begins
//! one gets its own [`StoreTransaction`], so concurrent writers never share
//! transaction state.

use async_trait::async_trait;

use assethub_core::result::AppResult;
use assethub_core::types::{AssetId, FolderId};
use assethub_entity::{Asset, AssetCriteria, Folder, FolderCriteria};

/// Row-level access to the folder table.
#[async_trait]
pub trait FolderRepository: Send + Sync + std::fmt::Debug {
    /// Find folders matching the criteria.
    async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>>;

    /// Count folders matching the criteria (offset and limit ignored).
    async fn count_folders(&self, criteria: &FolderCriteria) -> AppResult<u64>;

    /// Insert a folder without an id, or upsert the row with the folder's id.
    async fn save_folder(&self, folder: &Folder) -> AppResult<FolderId>;

    /// Delete folder rows by id. Returns the number of rows removed.
    async fn delete_folders(&self, ids: &[FolderId]) -> AppResult<u64>;
}

/// Row-level access to the asset table.
#[async_trait]
pub trait AssetRepository: Send + Sync + std::fmt::Debug {
    /// Find assets matching the criteria, ordered by filename.
    async fn find_assets(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>>;

    /// Count assets matching the criteria (offset and limit ignored).
    async fn count_assets(&self, criteria: &AssetCriteria) -> AppResult<u64>;

    /// Insert an asset without an id, or update the row with the asset's id.
    async fn save_asset(&self, asset: &Asset) -> AppResult<AssetId>;

    /// Delete one asset row. Returns whether a row was removed.
    async fn delete_asset(&self, id: AssetId) -> AppResult<bool>;

    /// Delete every asset row in the given folders.
    async fn delete_assets_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64>;
}

/// Opens transactions on a store.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    /// Open a transaction owned by the caller.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;
}

/// An open transaction. Reads see its own uncommitted writes; other
/// callers see none of them until [`commit`](StoreTransaction::commit).
///
/// Dropping the handle without committing discards the writes.
#[async_trait]
pub trait StoreTransaction: FolderRepository + AssetRepository {
    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Everything the index layer needs from persistence.
pub trait AssetStore: FolderRepository + AssetRepository + TransactionScope {}

impl<T> AssetStore for T where T: FolderRepository + AssetRepository + TransactionScope {}
