//! In-memory store.
//!
//! Backs tests and local tooling. A transaction works on a private copy of
//! the tables and, on commit, writes back only the rows it touched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::param::parse_list_param;
use assethub_core::types::{AssetId, FolderId};
use assethub_entity::folder::{FolderOrder, ParentFilter, PathFilter};
use assethub_entity::{Asset, AssetCriteria, Folder, FolderCriteria};

use crate::repositories::{AssetRepository, FolderRepository, StoreTransaction, TransactionScope};

#[derive(Debug, Clone, Default)]
struct Tables {
    folders: HashMap<FolderId, Folder>,
    assets: HashMap<AssetId, Asset>,
}

/// Rows removed by a folder delete, cascade included.
struct Removed {
    requested: u64,
    folders: Vec<FolderId>,
    assets: Vec<AssetId>,
}

impl Tables {
    fn find_folders(&self, criteria: &FolderCriteria) -> Vec<Folder> {
        let mut rows: Vec<Folder> = self
            .folders
            .values()
            .filter(|f| folder_matches(f, criteria))
            .cloned()
            .collect();
        match criteria.order {
            FolderOrder::Path => {
                rows.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name)))
            }
            FolderOrder::Name => rows.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        page(rows, criteria.offset, criteria.limit)
    }

    fn count_folders(&self, criteria: &FolderCriteria) -> u64 {
        self.folders
            .values()
            .filter(|f| folder_matches(f, criteria))
            .count() as u64
    }

    fn save_folder(&mut self, folder: &Folder) -> AppResult<FolderId> {
        let id = folder.id.unwrap_or_else(FolderId::new);

        let duplicate = self.folders.values().any(|f| {
            f.id != Some(id) && f.backend_id == folder.backend_id && f.path == folder.path
        });
        if duplicate {
            return Err(AppError::conflict(format!(
                "Folder path '{}' already exists",
                folder.path
            )));
        }

        let row = Folder {
            id: Some(id),
            ..folder.clone()
        };
        self.folders.insert(id, row);
        Ok(id)
    }

    fn delete_folders(&mut self, ids: &[FolderId]) -> Removed {
        // Cascade to child folders and their assets like the SQL schema does.
        let mut doomed: Vec<FolderId> = ids
            .iter()
            .copied()
            .filter(|id| self.folders.contains_key(id))
            .collect();
        let mut cursor = 0;
        while cursor < doomed.len() {
            let parent = doomed[cursor];
            let children: Vec<FolderId> = self
                .folders
                .values()
                .filter(|f| f.parent_id == Some(parent))
                .filter_map(|f| f.id)
                .filter(|id| !doomed.contains(id))
                .collect();
            doomed.extend(children);
            cursor += 1;
        }

        for id in &doomed {
            self.folders.remove(id);
        }
        let assets = self.delete_assets_in_folders(&doomed);
        Removed {
            requested: ids.iter().filter(|id| doomed.contains(id)).count() as u64,
            folders: doomed,
            assets,
        }
    }

    fn find_assets(&self, criteria: &AssetCriteria) -> Vec<Asset> {
        let mut rows: Vec<Asset> = self
            .assets
            .values()
            .filter(|a| asset_matches(a, criteria))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.filename.cmp(&b.filename).then_with(|| a.id.cmp(&b.id)));
        page(rows, criteria.offset, criteria.limit)
    }

    fn count_assets(&self, criteria: &AssetCriteria) -> u64 {
        self.assets
            .values()
            .filter(|a| asset_matches(a, criteria))
            .count() as u64
    }

    fn save_asset(&mut self, asset: &Asset) -> AppResult<AssetId> {
        if !self.folders.contains_key(&asset.folder_id) {
            return Err(AppError::database(format!(
                "Folder {} does not exist",
                asset.folder_id
            )));
        }
        let id = match asset.id {
            Some(id) if self.assets.contains_key(&id) => id,
            Some(id) => {
                return Err(AppError::not_found(format!(
                    "No asset exists with the ID “{id}”."
                )));
            }
            None => AssetId::new(),
        };
        let row = Asset {
            id: Some(id),
            ..asset.clone()
        };
        self.assets.insert(id, row);
        Ok(id)
    }

    fn delete_assets_in_folders(&mut self, folder_ids: &[FolderId]) -> Vec<AssetId> {
        let removed: Vec<AssetId> = self
            .assets
            .iter()
            .filter(|(_, a)| folder_ids.contains(&a.folder_id))
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            self.assets.remove(id);
        }
        removed
    }
}

/// Folder and asset rows held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn folder_matches(folder: &Folder, criteria: &FolderCriteria) -> bool {
    let id_ok = criteria.ids.is_empty() || folder.id.is_some_and(|id| criteria.ids.contains(&id));
    let backend_ok =
        criteria.backend_ids.is_empty() || criteria.backend_ids.contains(&folder.backend_id);
    let parent_ok = match criteria.parent {
        Some(ParentFilter::TopLevel) => folder.parent_id.is_none(),
        Some(ParentFilter::Is(parent_id)) => folder.parent_id == Some(parent_id),
        None => true,
    };
    let name_ok = criteria
        .name
        .as_ref()
        .is_none_or(|raw| parse_list_param(raw).contains(&folder.name));
    let path_ok = match &criteria.path {
        Some(PathFilter::Exact(raw)) => parse_list_param(raw).contains(&folder.path),
        Some(PathFilter::Prefix(prefix)) => folder.path.starts_with(prefix.as_str()),
        None => true,
    };
    id_ok && backend_ok && parent_ok && name_ok && path_ok
}

fn asset_matches(asset: &Asset, criteria: &AssetCriteria) -> bool {
    let id_ok = criteria.ids.is_empty() || asset.id.is_some_and(|id| criteria.ids.contains(&id));
    let backend_ok =
        criteria.backend_ids.is_empty() || criteria.backend_ids.contains(&asset.backend_id);
    let folder_ok =
        criteria.folder_ids.is_empty() || criteria.folder_ids.contains(&asset.folder_id);
    let filename_ok = criteria
        .filename
        .as_ref()
        .is_none_or(|raw| parse_list_param(raw).contains(&asset.filename));
    let kind_ok = criteria.kinds.is_empty() || criteria.kinds.contains(&asset.kind);
    id_ok && backend_ok && folder_ok && filename_ok && kind_ok
}

fn page<T>(rows: Vec<T>, offset: Option<u64>, limit: Option<u64>) -> Vec<T> {
    rows.into_iter()
        .skip(offset.unwrap_or(0) as usize)
        .take(limit.map_or(usize::MAX, |l| l as usize))
        .collect()
}

#[async_trait]
impl FolderRepository for MemoryStore {
    async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        Ok(self.tables.lock().await.find_folders(criteria))
    }

    async fn count_folders(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        Ok(self.tables.lock().await.count_folders(criteria))
    }

    async fn save_folder(&self, folder: &Folder) -> AppResult<FolderId> {
        self.tables.lock().await.save_folder(folder)
    }

    async fn delete_folders(&self, ids: &[FolderId]) -> AppResult<u64> {
        Ok(self.tables.lock().await.delete_folders(ids).requested)
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn find_assets(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        Ok(self.tables.lock().await.find_assets(criteria))
    }

    async fn count_assets(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        Ok(self.tables.lock().await.count_assets(criteria))
    }

    async fn save_asset(&self, asset: &Asset) -> AppResult<AssetId> {
        self.tables.lock().await.save_asset(asset)
    }

    async fn delete_asset(&self, id: AssetId) -> AppResult<bool> {
        Ok(self.tables.lock().await.assets.remove(&id).is_some())
    }

    async fn delete_assets_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64> {
        let removed = self.tables.lock().await.delete_assets_in_folders(folder_ids);
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl TransactionScope for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let work = self.tables.lock().await.clone();
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            work: Mutex::new(Work {
                tables: work,
                folders: HashSet::new(),
                assets: HashSet::new(),
            }),
        }))
    }
}

#[derive(Debug)]
struct Work {
    tables: Tables,
    folders: HashSet<FolderId>,
    assets: HashSet<AssetId>,
}

/// A private copy of the tables plus the ids written through it.
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    work: Mutex<Work>,
}

#[async_trait]
impl FolderRepository for MemoryTransaction {
    async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        Ok(self.work.lock().await.tables.find_folders(criteria))
    }

    async fn count_folders(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        Ok(self.work.lock().await.tables.count_folders(criteria))
    }

    async fn save_folder(&self, folder: &Folder) -> AppResult<FolderId> {
        let mut work = self.work.lock().await;
        let id = work.tables.save_folder(folder)?;
        work.folders.insert(id);
        Ok(id)
    }

    async fn delete_folders(&self, ids: &[FolderId]) -> AppResult<u64> {
        let mut work = self.work.lock().await;
        let removed = work.tables.delete_folders(ids);
        work.folders.extend(removed.folders);
        work.assets.extend(removed.assets);
        Ok(removed.requested)
    }
}

#[async_trait]
impl AssetRepository for MemoryTransaction {
    async fn find_assets(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        Ok(self.work.lock().await.tables.find_assets(criteria))
    }

    async fn count_assets(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        Ok(self.work.lock().await.tables.count_assets(criteria))
    }

    async fn save_asset(&self, asset: &Asset) -> AppResult<AssetId> {
        let mut work = self.work.lock().await;
        let id = work.tables.save_asset(asset)?;
        work.assets.insert(id);
        Ok(id)
    }

    async fn delete_asset(&self, id: AssetId) -> AppResult<bool> {
        let mut work = self.work.lock().await;
        let existed = work.tables.assets.remove(&id).is_some();
        work.assets.insert(id);
        Ok(existed)
    }

    async fn delete_assets_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64> {
        let mut work = self.work.lock().await;
        let removed = work.tables.delete_assets_in_folders(folder_ids);
        let count = removed.len() as u64;
        work.assets.extend(removed);
        Ok(count)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { store, work } = *self;
        let work = work.into_inner();
        let mut tables = store.tables.lock().await;
        for id in &work.folders {
            match work.tables.folders.get(id) {
                Some(row) => tables.folders.insert(*id, row.clone()),
                None => tables.folders.remove(id),
            };
        }
        for id in &work.assets {
            match work.tables.assets.get(id) {
                Some(row) => tables.assets.insert(*id, row.clone()),
                None => tables.assets.remove(id),
            };
        }
        debug!(
            folders = work.folders.len(),
            assets = work.assets.len(),
            "Memory transaction committed"
        );
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assethub_core::types::BackendId;

    async fn seeded() -> (MemoryStore, Folder, Folder) {
        let store = MemoryStore::new();
        let mut root = Folder::top_level(BackendId::new(), "Uploads");
        root.id = Some(store.save_folder(&root).await.unwrap());
        let mut photos = root.new_child("photos");
        photos.id = Some(store.save_folder(&photos).await.unwrap());
        (store, root, photos)
    }

    #[tokio::test]
    async fn test_duplicate_path_is_rejected() {
        let (store, root, _) = seeded().await;
        let err = store.save_folder(&root.new_child("photos")).await.unwrap_err();
        assert_eq!(err.kind, assethub_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_folder_with_unused_id_is_inserted() {
        let (store, root, _) = seeded().await;
        let id = FolderId::new();
        let docs = Folder {
            id: Some(id),
            ..root.new_child("docs")
        };

        assert_eq!(store.save_folder(&docs).await.unwrap(), id);
        let found = store.find_folders(&FolderCriteria::by_id(id)).await.unwrap();
        assert_eq!(found, vec![docs]);
    }

    #[tokio::test]
    async fn test_find_by_escaped_path() {
        let (store, root, _) = seeded().await;
        let mut odd = root.new_child("a, b");
        odd.id = Some(store.save_folder(&odd).await.unwrap());

        let found = store
            .find_folders(&FolderCriteria::default().path("a, b/"))
            .await
            .unwrap();
        assert_eq!(found, vec![odd]);
    }

    #[tokio::test]
    async fn test_rollback_discards_rows() {
        let (store, _, photos) = seeded().await;
        let photos_id = photos.id.unwrap();

        let tx = store.begin().await.unwrap();
        tx.save_asset(&Asset::new(photos.backend_id, photos_id, "a.jpg"))
            .await
            .unwrap();
        assert_eq!(tx.count_assets(&AssetCriteria::default()).await.unwrap(), 1);
        assert_eq!(store.count_assets(&AssetCriteria::default()).await.unwrap(), 0);
        tx.rollback().await.unwrap();

        let count = store
            .count_assets(&AssetCriteria::default().folder(photos_id))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_rollback_keeps_writes_made_outside_the_transaction() {
        let (store, _, photos) = seeded().await;
        let photos_id = photos.id.unwrap();

        let tx = store.begin().await.unwrap();
        tx.save_asset(&Asset::new(photos.backend_id, photos_id, "mine.jpg"))
            .await
            .unwrap();
        let theirs = store
            .save_asset(&Asset::new(photos.backend_id, photos_id, "theirs.jpg"))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let rows = store.find_assets(&AssetCriteria::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, Some(theirs));
    }

    #[tokio::test]
    async fn test_commit_merges_with_concurrent_writes() {
        let (store, _, photos) = seeded().await;
        let photos_id = photos.id.unwrap();

        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();
        first
            .save_asset(&Asset::new(photos.backend_id, photos_id, "a.jpg"))
            .await
            .unwrap();
        second
            .save_asset(&Asset::new(photos.backend_id, photos_id, "b.jpg"))
            .await
            .unwrap();
        store
            .save_asset(&Asset::new(photos.backend_id, photos_id, "c.jpg"))
            .await
            .unwrap();
        first.commit().await.unwrap();
        second.commit().await.unwrap();

        let names: Vec<String> = store
            .find_assets(&AssetCriteria::default())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.filename)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn test_committed_folder_delete_cascades() {
        let (store, root, photos) = seeded().await;
        store
            .save_asset(&Asset::new(root.backend_id, photos.id.unwrap(), "a.jpg"))
            .await
            .unwrap();

        let tx = store.begin().await.unwrap();
        tx.delete_folders(&[root.id.unwrap()]).await.unwrap();
        assert_eq!(store.count_folders(&FolderCriteria::default()).await.unwrap(), 2);
        tx.commit().await.unwrap();

        assert_eq!(store.count_folders(&FolderCriteria::default()).await.unwrap(), 0);
        assert_eq!(store.count_assets(&AssetCriteria::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children_and_assets() {
        let (store, root, photos) = seeded().await;
        let mut summer = photos.new_child("summer");
        summer.id = Some(store.save_folder(&summer).await.unwrap());
        store
            .save_asset(&Asset::new(root.backend_id, summer.id.unwrap(), "a.jpg"))
            .await
            .unwrap();

        let removed = store.delete_folders(&[photos.id.unwrap()]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            store.count_folders(&FolderCriteria::default()).await.unwrap(),
            1
        );
        assert_eq!(store.count_assets(&AssetCriteria::default()).await.unwrap(), 0);
    }
}
