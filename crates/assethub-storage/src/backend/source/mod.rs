//! Indexed backend over any byte-level provider.
//!
//! Local disk, object stores and the staging area all share this
//! implementation; they differ only in the [`StorageProvider`] underneath.
//! A file's storage key is its folder's path followed by its filename.

mod files;
mod folders;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use assethub_core::config::{BackendConfig, BackendKind, StorageConfig};
use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::traits::StorageProvider;
use assethub_core::types::operation::{FILE_ID, FILENAME};
use assethub_core::types::{AssetId, BackendId};
use assethub_core::OperationResult;
use assethub_entity::naming::{self, NamingOptions};
use assethub_entity::{Asset, ConflictResolution, Folder};
use assethub_index::{AssetIndex, FolderIndex};

use super::{StorageBackend, Upload};
use crate::scratch::{ScratchArea, ScratchCopy};

/// Data item set when a move was skipped by a `Cancel` decision.
pub const SKIPPED: &str = "skipped";

/// Upload and naming rules shared by every backend.
#[derive(Debug, Clone)]
struct Rules {
    naming: NamingOptions,
    allowed_extensions: Vec<String>,
    max_upload_size: u64,
    max_name_attempts: u32,
}

impl Rules {
    fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

/// Where a file lands after a destination name clash is settled.
enum Placement {
    /// Store under this filename.
    Free(String),
    /// Nothing to store; report this result.
    Settled(OperationResult),
}

/// A [`StorageBackend`] that indexes a [`StorageProvider`].
#[derive(Debug, Clone)]
pub struct SourceBackend {
    config: BackendConfig,
    provider: Arc<dyn StorageProvider>,
    folders: FolderIndex,
    assets: AssetIndex,
    scratch: ScratchArea,
    rules: Rules,
}

impl SourceBackend {
    pub fn new(
        config: BackendConfig,
        provider: Arc<dyn StorageProvider>,
        folders: FolderIndex,
        assets: AssetIndex,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            config,
            provider,
            folders,
            assets,
            scratch: ScratchArea::new(&storage.scratch_dir),
            rules: Rules {
                naming: NamingOptions::from(storage),
                allowed_extensions: storage.allowed_extensions.clone(),
                max_upload_size: storage.max_upload_size_bytes,
                max_name_attempts: storage.max_name_replacement_attempts,
            },
        }
    }

    /// The byte-level provider.
    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    fn key(folder: &Folder, filename: &str) -> String {
        format!("{}{filename}", folder.path)
    }

    async fn folder_of(&self, asset: &Asset) -> AppResult<Folder> {
        self.folders
            .get_by_id(asset.folder_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {} not found", asset.folder_id)))
    }

    fn ensure_own(&self, folder: &Folder) -> AppResult<()> {
        if folder.backend_id != self.config.id {
            return Err(AppError::validation(format!(
                "Folder '{}' does not belong to backend '{}'",
                folder.name, self.config.name
            )));
        }
        Ok(())
    }

    /// Clean a filename and check its extension.
    fn clean_filename(&self, raw: &str) -> AppResult<String> {
        let filename = naming::clean_asset_name(raw, true, &self.rules.naming);
        let extension = naming::extension(&filename).unwrap_or_default();
        if !self.rules.is_extension_allowed(extension) {
            return Err(AppError::validation(format!(
                "“{extension}” is not an allowed file extension."
            )));
        }
        Ok(filename)
    }

    /// Whether `filename` in `folder` is held by anything other than `except`,
    /// in the index or on the medium.
    async fn name_taken(
        &self,
        folder: &Folder,
        filename: &str,
        except: Option<AssetId>,
    ) -> AppResult<bool> {
        let folder_id = folder.require_id()?;
        match self.assets.find_in_folder(folder_id, filename).await? {
            Some(row) => Ok(row.id != except),
            None => self.provider.exists(&Self::key(folder, filename)).await,
        }
    }

    /// First free `base_N.ext` variant of `filename` in `folder`.
    async fn available_name(&self, folder: &Folder, filename: &str) -> AppResult<String> {
        for n in 1..=self.rules.max_name_attempts {
            let candidate = naming::numbered_filename(filename, n);
            if !self.name_taken(folder, &candidate, None).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::conflict(format!(
            "Could not find a suitable replacement filename for “{filename}”."
        )))
    }

    /// Settle a name clash at the destination of a move or transfer.
    async fn place(
        &self,
        dest: &Folder,
        filename: &str,
        moving: AssetId,
        action: Option<ConflictResolution>,
    ) -> AppResult<Placement> {
        if !self.name_taken(dest, filename, Some(moving)).await? {
            return Ok(Placement::Free(filename.to_string()));
        }

        match action {
            None => Ok(Placement::Settled(
                OperationResult::conflict(exists_prompt(filename))
                    .with_data(FILE_ID, moving)
                    .with_data(FILENAME, filename),
            )),
            Some(ConflictResolution::Cancel) => Ok(Placement::Settled(
                OperationResult::success()
                    .with_data(FILE_ID, moving)
                    .with_data(SKIPPED, true),
            )),
            Some(ConflictResolution::KeepBoth) => {
                Ok(Placement::Free(self.available_name(dest, filename).await?))
            }
            Some(ConflictResolution::Replace) => {
                self.remove_existing(dest, filename, moving).await?;
                Ok(Placement::Free(filename.to_string()))
            }
        }
    }

    /// Delete whatever occupies `filename` in `folder`, bytes and row.
    async fn remove_existing(
        &self,
        folder: &Folder,
        filename: &str,
        keep: AssetId,
    ) -> AppResult<()> {
        let folder_id = folder.require_id()?;
        let existing = self.assets.find_in_folder(folder_id, filename).await?;
        if let Some(id) = existing.and_then(|row| row.id).filter(|id| *id != keep) {
            self.assets.delete(id).await?;
        }
        self.provider.delete(&Self::key(folder, filename)).await
    }
}

pub(crate) fn exists_prompt(filename: &str) -> String {
    format!("A file with the name “{filename}” already exists in the folder.")
}

#[async_trait]
impl StorageBackend for SourceBackend {
    fn id(&self) -> BackendId {
        self.config.id
    }

    fn kind(&self) -> BackendKind {
        self.config.kind
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn root_folder(&self) -> AppResult<Folder> {
        self.ensure_root_folder().await
    }

    async fn create_folder(&self, parent: &Folder, name: &str) -> OperationResult {
        self.create_folder_inner(parent, name)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn rename_folder(&self, folder: &Folder, new_name: &str) -> OperationResult {
        self.rename_folder_inner(folder, new_name)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn move_folder(
        &self,
        folder: &Folder,
        new_parent: &Folder,
        merge_existing: bool,
    ) -> OperationResult {
        self.move_folder_inner(folder, new_parent, merge_existing)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn delete_folder(&self, folder: &Folder) -> OperationResult {
        self.delete_folder_inner(folder)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn folder_exists(&self, parent_path: &str, name: &str) -> AppResult<bool> {
        self.provider
            .dir_exists(&format!("{parent_path}{name}/"))
            .await
    }

    async fn upload_file(&self, folder: &Folder, upload: Upload) -> OperationResult {
        self.upload_inner(folder, upload)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn insert_file_by_path(
        &self,
        local_path: &Path,
        folder: &Folder,
        filename: &str,
    ) -> OperationResult {
        self.insert_inner(local_path, folder, filename)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn delete_file(&self, asset: &Asset) -> AppResult<()> {
        let folder = self.folder_of(asset).await?;
        self.provider
            .delete(&Self::key(&folder, &asset.filename))
            .await
    }

    async fn replace_file(&self, target: &Asset, source: &Asset) -> AppResult<()> {
        self.replace_inner(target, source).await
    }

    async fn get_local_copy(&self, asset: &Asset) -> AppResult<ScratchCopy> {
        let folder = self.folder_of(asset).await?;
        let copy = self.scratch.reserve(&asset.filename).await?;
        self.provider
            .download_to(&Self::key(&folder, &asset.filename), &copy)
            .await?;
        Ok(copy)
    }

    async fn file_exists(&self, folder: &Folder, filename: &str) -> AppResult<bool> {
        self.provider.exists(&Self::key(folder, filename)).await
    }

    async fn index_existing_file(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>> {
        self.index_existing_inner(folder, filename).await
    }

    async fn describe_existing_file(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>> {
        self.describe_existing_inner(folder, filename).await
    }

    async fn move_file_inside_source(
        &self,
        origin: BackendId,
        asset: &Asset,
        dest: &Folder,
        new_filename: &str,
        action: Option<ConflictResolution>,
    ) -> Option<OperationResult> {
        if origin != self.config.id || dest.backend_id != self.config.id {
            return None;
        }
        Some(
            self.move_inside_inner(asset, dest, new_filename, action)
                .await
                .unwrap_or_else(OperationResult::from),
        )
    }

    async fn transfer_file_into_source(
        &self,
        local_path: &Path,
        dest: &Folder,
        incoming: &Asset,
        action: Option<ConflictResolution>,
    ) -> OperationResult {
        self.transfer_in_inner(local_path, dest, incoming, action)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn finalize_transfer(&self, original: &Asset) -> AppResult<()> {
        let folder = self.folder_of(original).await?;
        self.provider
            .delete(&Self::key(&folder, &original.filename))
            .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use assethub_core::config::IndexConfig;
    use assethub_database::MemoryStore;

    use crate::providers::{LocalStorageProvider, MemoryObjectClient, ObjectStoreProvider};

    pub struct Fixture {
        pub dir: tempfile::TempDir,
        pub store: MemoryStore,
        pub folders: FolderIndex,
        pub assets: AssetIndex,
        pub storage: StorageConfig,
    }

    impl Fixture {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = MemoryStore::new();
            let shared: Arc<dyn assethub_database::AssetStore> = Arc::new(store.clone());
            let storage = StorageConfig {
                scratch_dir: dir.path().join("scratch").to_string_lossy().to_string(),
                ..StorageConfig::default()
            };
            Self {
                folders: FolderIndex::new(shared.clone(), &IndexConfig::default()),
                assets: AssetIndex::new(shared),
                store,
                storage,
                dir,
            }
        }

        fn backend_config(name: &str, kind: BackendKind) -> BackendConfig {
            BackendConfig {
                id: BackendId::new(),
                name: name.to_string(),
                kind,
                sort_order: 0,
                root_path: None,
                bucket: None,
                endpoint: None,
                region: None,
                url_base: Some(format!("https://cdn.example.com/{}", name.to_lowercase())),
            }
        }

        pub async fn local(&self, name: &str) -> SourceBackend {
            let root = self.dir.path().join(name);
            let provider = LocalStorageProvider::new(root.to_str().unwrap())
                .await
                .unwrap();
            SourceBackend::new(
                Self::backend_config(name, BackendKind::Local),
                Arc::new(provider),
                self.folders.clone(),
                self.assets.clone(),
                &self.storage,
            )
        }

        pub fn object(&self, name: &str) -> SourceBackend {
            let provider = ObjectStoreProvider::new(Arc::new(MemoryObjectClient::new()), name);
            SourceBackend::new(
                Self::backend_config(name, BackendKind::Object),
                Arc::new(provider),
                self.folders.clone(),
                self.assets.clone(),
                &self.storage,
            )
        }

        pub fn scratch_entries(&self) -> usize {
            std::fs::read_dir(&self.storage.scratch_dir)
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }
}
