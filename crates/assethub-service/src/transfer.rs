//! Moving and renaming files, inside one backend or across two.
//!
//! The destination backend gets the first try through
//! [`StorageBackend::move_file_inside_source`]. When it declines, the file
//! travels through a scratch copy: the origin backend writes it to local
//! disk, the destination backend commits it, and the origin cleans up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::operation::{FILE_ID, FILENAME, RESULTS};
use assethub_core::types::{AssetId, FolderId};
use assethub_core::OperationResult;
use assethub_entity::naming::{self, NamingOptions};
use assethub_entity::{Asset, ConflictResolution, Folder};
use assethub_index::{AssetIndex, FolderIndex};
use assethub_storage::backend::source::SKIPPED;
use assethub_storage::{BackendRegistry, StorageBackend};

use crate::collaborators::TransformProvider;

/// A batch of files to move into one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveRequest {
    pub file_ids: Vec<AssetId>,
    pub dest_folder_id: FolderId,
    /// New filename. Only valid for a single file; empty keeps the name.
    pub new_filename: String,
    /// Conflict decisions, aligned with `file_ids`. Missing entries mean
    /// no decision.
    pub actions: Vec<Option<ConflictResolution>>,
}

impl MoveRequest {
    pub fn new(file_ids: Vec<AssetId>, dest_folder_id: FolderId) -> Self {
        Self {
            file_ids,
            dest_folder_id,
            ..Self::default()
        }
    }

    pub fn rename(mut self, new_filename: impl Into<String>) -> Self {
        self.new_filename = new_filename.into();
        self
    }

    pub fn actions(mut self, actions: Vec<Option<ConflictResolution>>) -> Self {
        self.actions = actions;
        self
    }

    fn action(&self, index: usize) -> Option<ConflictResolution> {
        self.actions.get(index).copied().flatten()
    }
}

/// Coordinates file moves between folders and backends.
#[derive(Debug, Clone)]
pub struct TransferOrchestrator {
    registry: Arc<BackendRegistry>,
    folders: FolderIndex,
    assets: AssetIndex,
    transforms: Arc<dyn TransformProvider>,
    naming: NamingOptions,
}

impl TransferOrchestrator {
    pub fn new(
        registry: Arc<BackendRegistry>,
        folders: FolderIndex,
        assets: AssetIndex,
        transforms: Arc<dyn TransformProvider>,
        naming: NamingOptions,
    ) -> Self {
        Self {
            registry,
            folders,
            assets,
            transforms,
            naming,
        }
    }

    /// Move (and for a single file, optionally rename) a batch of files.
    ///
    /// A single file reports its own result. A batch reports every item
    /// under `results`; the batch status is the first error, else the first
    /// conflict, else success.
    pub async fn move_files(&self, request: &MoveRequest) -> OperationResult {
        self.move_files_inner(request)
            .await
            .unwrap_or_else(OperationResult::from)
    }

    async fn move_files_inner(&self, request: &MoveRequest) -> AppResult<OperationResult> {
        let renaming = !request.new_filename.is_empty();
        if renaming && request.file_ids.len() > 1 {
            return Ok(OperationResult::error(
                "It’s not possible to rename multiple files!",
            ));
        }

        let dest = self
            .folders
            .get_by_id(request.dest_folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the destination folder!"))?;
        let dest_backend = self.registry.get_backend(dest.backend_id)?;

        if !self.destination_exists(dest_backend.as_ref(), &dest).await? {
            return Ok(OperationResult::error(format!(
                "The folder “{}” does not exist on the storage.",
                dest.name
            )));
        }

        let mut results = Vec::with_capacity(request.file_ids.len());
        for (index, file_id) in request.file_ids.iter().enumerate() {
            let new_name = renaming.then_some(request.new_filename.as_str());
            let result = self
                .move_one(
                    *file_id,
                    &dest,
                    dest_backend.as_ref(),
                    new_name,
                    request.action(index),
                )
                .await
                .unwrap_or_else(OperationResult::from);
            results.push(result);
        }

        if results.len() == 1 {
            return Ok(results.remove(0));
        }
        Ok(summarize(results))
    }

    /// Whether the destination's directory exists on its backend.
    async fn destination_exists(
        &self,
        backend: &dyn StorageBackend,
        dest: &Folder,
    ) -> AppResult<bool> {
        let Some(parent_id) = dest.parent_id else {
            return Ok(true);
        };
        let parent = self
            .folders
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the parent folder!"))?;
        backend.folder_exists(&parent.path, &dest.name).await
    }

    /// Name a file ends up with: the requested or current name, the
    /// original extension restored when missing, then cleaned.
    fn target_filename(&self, asset: &Asset, new_name: Option<&str>) -> String {
        let requested = new_name.unwrap_or(&asset.filename);
        let filename = match (naming::extension(requested), naming::extension(&asset.filename)) {
            (None, Some(extension)) => format!("{requested}.{extension}"),
            _ => requested.to_string(),
        };
        naming::clean_asset_name(&filename, true, &self.naming)
    }

    async fn move_one(
        &self,
        file_id: AssetId,
        dest: &Folder,
        dest_backend: &dyn StorageBackend,
        new_name: Option<&str>,
        action: Option<ConflictResolution>,
    ) -> AppResult<OperationResult> {
        let asset = self
            .assets
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the file!"))?;
        let filename = self.target_filename(&asset, new_name);

        if dest.id == Some(asset.folder_id) && filename == asset.filename {
            debug!(file_id = %file_id, "File already in place");
            return Ok(OperationResult::success()
                .with_data(FILE_ID, file_id)
                .with_data(FILENAME, &filename));
        }

        if let Some(result) = dest_backend
            .move_file_inside_source(asset.backend_id, &asset, dest, &filename, action)
            .await
        {
            return Ok(result);
        }

        self.transfer(asset, filename, dest, dest_backend, action)
            .await
    }

    /// Cross-backend move through a scratch copy.
    async fn transfer(
        &self,
        asset: Asset,
        filename: String,
        dest: &Folder,
        dest_backend: &dyn StorageBackend,
        action: Option<ConflictResolution>,
    ) -> AppResult<OperationResult> {
        let origin = self.registry.get_backend(asset.backend_id)?;
        // Removed from disk when dropped, on every return path.
        let scratch = origin.get_local_copy(&asset).await?;

        let original = asset.clone();
        let incoming = Asset { filename, ..asset };
        let result = dest_backend
            .transfer_file_into_source(&scratch, dest, &incoming, action)
            .await;

        if result.is_success() && result.data_item(SKIPPED).is_none() {
            if let Err(e) = self.transforms.delete_all_transform_data(&original).await {
                warn!(file_id = ?original.id, error = %e, "Failed to drop transforms of moved file");
            }
            origin.finalize_transfer(&original).await?;
            info!(
                file_id = ?original.id,
                from = %original.backend_id,
                to = %dest.backend_id,
                "Transferred file between backends"
            );
        }

        if let Err(e) = scratch.close() {
            warn!(error = %e, "Failed to remove scratch copy");
        }
        Ok(result)
    }
}

fn summarize(results: Vec<OperationResult>) -> OperationResult {
    let summary = if let Some(failed) = results.iter().find(|r| r.is_error()) {
        OperationResult::error(failed.error_message().unwrap_or("A file could not be moved."))
    } else if let Some(conflict) = results.iter().find(|r| r.is_conflict()) {
        OperationResult::conflict(conflict.prompt().unwrap_or_default())
    } else {
        OperationResult::success()
    };
    summary.with_data(RESULTS, &results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assethub_core::traits::StorageProvider;
    use assethub_entity::AssetCriteria;

    use crate::test_support::Harness;

    #[test]
    fn test_missing_actions_mean_no_decision() {
        let request = MoveRequest::new(vec![AssetId::new(), AssetId::new()], FolderId::new())
            .actions(vec![Some(ConflictResolution::Replace)]);
        assert_eq!(request.action(0), Some(ConflictResolution::Replace));
        assert_eq!(request.action(1), None);
    }

    #[tokio::test]
    async fn test_batch_rename_rejected_without_mutation() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        let first = h.upload(&folder, "one.txt", "1").await.file_id().unwrap();
        let second = h.upload(&folder, "two.txt", "2").await.file_id().unwrap();

        let request = MoveRequest::new(vec![first, second], folder.id.unwrap()).rename("x.txt");
        let result = h.orchestrator().move_files(&request).await;

        assert!(result.is_error());
        let names: Vec<_> = h
            .assets
            .find(&AssetCriteria::default())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.filename)
            .collect();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
    }

    #[tokio::test]
    async fn test_rename_restores_extension_and_cleans() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        let id = h.upload(&folder, "one.txt", "1").await.file_id().unwrap();

        let request = MoveRequest::new(vec![id], folder.id.unwrap()).rename("new name");
        let result = h.orchestrator().move_files(&request).await;

        assert!(result.is_success());
        assert_eq!(result.filename().as_deref(), Some("new-name.txt"));
        assert_eq!(h.read(h.local, "a/new-name.txt").await, "1");
    }

    #[tokio::test]
    async fn test_move_to_same_place_is_noop() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        let id = h.upload(&folder, "one.txt", "1").await.file_id().unwrap();
        let before = h.assets.get_by_id(id).await.unwrap();

        let result = h
            .orchestrator()
            .move_files(&MoveRequest::new(vec![id], folder.id.unwrap()))
            .await;

        assert!(result.is_success());
        assert_eq!(h.assets.get_by_id(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_destination_directory_fails_whole_batch() {
        let h = Harness::new().await;
        let source = h.folder(h.local, "a").await;
        let dest = h.folder(h.object, "b").await;
        let id = h.upload(&source, "one.txt", "1").await.file_id().unwrap();
        h.provider(h.object).delete_dir("b/").await.unwrap();

        let result = h
            .orchestrator()
            .move_files(&MoveRequest::new(vec![id], dest.id.unwrap()))
            .await;

        assert!(result.is_error());
        assert_eq!(h.assets.get_by_id(id).await.unwrap().unwrap().folder_id, source.id.unwrap());
    }

    #[tokio::test]
    async fn test_cross_backend_move_keeps_id_and_cleans_up() {
        let h = Harness::new().await;
        let source = h.folder(h.local, "a").await;
        let dest = h.folder(h.object, "b").await;
        let id = h.upload(&source, "one.txt", "payload").await.file_id().unwrap();

        let result = h
            .orchestrator()
            .move_files(&MoveRequest::new(vec![id], dest.id.unwrap()))
            .await;

        assert!(result.is_success());
        let moved = h.assets.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(moved.backend_id, h.object);
        assert_eq!(moved.folder_id, dest.id.unwrap());
        assert_eq!(h.read(h.object, "b/one.txt").await, "payload");
        assert!(!h.provider(h.local).exists("a/one.txt").await.unwrap());
        assert_eq!(h.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn test_batch_reports_each_item() {
        let h = Harness::new().await;
        let a = h.folder(h.local, "a").await;
        let b = h.folder(h.local, "b").await;
        let one = h.upload(&a, "one.txt", "1").await.file_id().unwrap();
        let two = h.upload(&a, "two.txt", "2").await.file_id().unwrap();
        h.upload(&b, "two.txt", "resident").await;

        let result = h
            .orchestrator()
            .move_files(&MoveRequest::new(vec![one, two], b.id.unwrap()))
            .await;

        assert!(result.is_conflict());
        let items: Vec<OperationResult> = result.data_as(RESULTS).unwrap();
        assert!(items[0].is_success());
        assert!(items[1].is_conflict());
    }
}
