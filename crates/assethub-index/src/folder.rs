//! Cached folder lookups and tree building.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use assethub_core::config::IndexConfig;
use assethub_core::result::AppResult;
use assethub_core::types::{BackendId, FolderId};
use assethub_database::{AssetStore, FolderRepository};
use assethub_entity::folder::FolderOrder;
use assethub_entity::{Folder, FolderCriteria, FolderTree};

/// Folder query layer with an id cache.
///
/// Both hits and misses are cached until the configured TTL runs out.
/// Writes through this index replace the entry for the written id, and
/// deletes evict the deleted folders together with their descendants.
#[derive(Debug, Clone)]
pub struct FolderIndex {
    store: Arc<dyn AssetStore>,
    cache: Cache<FolderId, Option<Folder>>,
}

impl FolderIndex {
    /// Create an index over a store.
    pub fn new(store: Arc<dyn AssetStore>, config: &IndexConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.folder_cache_capacity)
            .time_to_live(Duration::from_secs(config.folder_cache_ttl_seconds))
            .build();
        Self { store, cache }
    }

    /// The store behind the index.
    pub fn backing_store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    async fn remember(&self, id: FolderId, folder: Option<Folder>) {
        self.cache.insert(id, folder).await;
    }

    /// Look up a folder by id. Absent folders yield `Ok(None)`.
    pub async fn get_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        if let Some(hit) = self.cache.get(&id).await {
            return Ok(hit);
        }

        let folder = self
            .store
            .find_folders(&FolderCriteria::by_id(id).limit(1))
            .await?
            .into_iter()
            .next();
        debug!(folder_id = %id, found = folder.is_some(), "Folder cache miss");
        self.remember(id, folder.clone()).await;
        Ok(folder)
    }

    /// Find folders. Every result refreshes its cache entry.
    pub async fn find(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        let folders = self.store.find_folders(criteria).await?;
        for folder in &folders {
            if let Some(id) = folder.id {
                self.remember(id, Some(folder.clone())).await;
            }
        }
        Ok(folders)
    }

    /// The first folder matching the criteria.
    pub async fn find_one(&self, criteria: &FolderCriteria) -> AppResult<Option<Folder>> {
        let criteria = criteria.clone().limit(1);
        Ok(self.find(&criteria).await?.into_iter().next())
    }

    /// Number of folders matching the criteria.
    pub async fn count(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        self.store.count_folders(criteria).await
    }

    /// Every folder of the same backend whose path starts with this folder's
    /// path, the folder itself included.
    pub async fn descendants_of(&self, folder: &Folder) -> AppResult<HashMap<FolderId, Folder>> {
        let criteria = FolderCriteria::default()
            .backend(folder.backend_id)
            .path_prefix(&folder.path);
        let descendants = self
            .find(&criteria)
            .await?
            .into_iter()
            .filter_map(|f| f.id.map(|id| (id, f)))
            .collect();
        Ok(descendants)
    }

    /// Insert or update a folder row and return its id.
    pub async fn store(&self, folder: &Folder) -> AppResult<FolderId> {
        let id = self.store.save_folder(folder).await?;
        self.remember(
            id,
            Some(Folder {
                id: Some(id),
                ..folder.clone()
            }),
        )
        .await;
        Ok(id)
    }

    /// Delete folder rows (children and their assets cascade) and evict
    /// them, descendants included, from the cache.
    pub async fn delete(&self, ids: &[FolderId]) -> AppResult<u64> {
        let mut evicted: Vec<FolderId> = ids.to_vec();
        for id in ids {
            if let Some(folder) = self.get_by_id(*id).await? {
                evicted.extend(self.descendants_of(&folder).await?.into_keys());
            }
        }

        let removed = self.store.delete_folders(ids).await?;
        self.invalidate(&evicted).await;
        debug!(requested = ids.len(), evicted = evicted.len(), "Folders deleted");
        Ok(removed)
    }

    /// Drop cache entries.
    pub async fn invalidate(&self, ids: &[FolderId]) {
        for id in ids {
            self.cache.invalidate(id).await;
        }
    }

    /// Drop every cache entry.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// Build a forest from folders and order the roots by their backend's
    /// sort order.
    ///
    /// The folders are re-sorted by path first, so any input order works.
    pub fn build_tree(
        &self,
        mut folders: Vec<Folder>,
        sort_order: impl Fn(BackendId) -> i32,
    ) -> FolderTree {
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        let mut tree = FolderTree::build(folders);
        tree.sort_roots_by_key(|root| sort_order(root.backend_id));
        tree
    }

    /// Load every folder of the given backends as one forest.
    pub async fn tree_for_backends(
        &self,
        backend_ids: &[BackendId],
        sort_order: impl Fn(BackendId) -> i32,
    ) -> AppResult<FolderTree> {
        let criteria = FolderCriteria::default()
            .backends(backend_ids.iter().copied())
            .order_by(FolderOrder::Path);
        let folders = self.find(&criteria).await?;
        Ok(self.build_tree(folders, sort_order))
    }
}
