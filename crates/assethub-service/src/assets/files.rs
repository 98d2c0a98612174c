//! File operations of the asset service.

use std::path::Path;

use tracing::{info, warn};

use assethub_core::result::AppResult;
use assethub_core::types::operation::{FILE_ID, RESULTS};
use assethub_core::types::{AssetId, BackendId, FolderId};
use assethub_core::OperationResult;
use assethub_entity::asset::is_image_manipulatable;
use assethub_entity::{Asset, AssetCriteria, AssetKind, ConflictResolution};
use assethub_storage::backend::source::SKIPPED;
use assethub_storage::Upload;

use super::AssetService;
use crate::collaborators::GENERATE_PENDING_TRANSFORMS;
use crate::conflict::MergeContext;
use crate::lifecycle::Removal;
use crate::transfer::MoveRequest;

/// An upload call: either a new payload or the answer to an earlier conflict.
#[derive(Debug, Clone)]
pub enum UploadRequest {
    /// Store a new payload.
    Store(Upload),
    /// Settle the conflict a previous upload reported.
    Resolve(MergeContext),
}

impl AssetService {
    pub async fn get_file_by_id(&self, file_id: AssetId) -> AppResult<Option<Asset>> {
        self.assets.get_by_id(file_id).await
    }

    pub async fn get_files_by_backend_id(&self, backend_id: BackendId) -> AppResult<Vec<Asset>> {
        self.assets
            .find(&AssetCriteria::default().backend(backend_id))
            .await
    }

    pub async fn find_files(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        self.assets.find(criteria).await
    }

    pub async fn find_file(&self, criteria: &AssetCriteria) -> AppResult<Option<Asset>> {
        self.assets.find_one(criteria).await
    }

    pub async fn get_total_files(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        self.assets.count(criteria).await
    }

    /// Delete files one at a time, firing hooks for each.
    ///
    /// With `delete_file` the stored bytes and transforms go too; the row
    /// is removed either way. Stops at the first failure, reporting the
    /// files handled so far under `results`.
    pub async fn delete_files(&self, file_ids: &[AssetId], delete_file: bool) -> OperationResult {
        let mut results = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            match self.delete_one(*file_id, delete_file).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(file_id = %file_id, error = %e, "File delete failed");
                    return OperationResult::from(e).with_data(RESULTS, &results);
                }
            }
        }
        OperationResult::success().with_data(RESULTS, &results)
    }

    async fn delete_one(&self, file_id: AssetId, delete_file: bool) -> AppResult<OperationResult> {
        let asset = self.require_file(file_id).await?;

        match self.lifecycle.remove(&asset, delete_file).await? {
            Removal::Vetoed(reason) => {
                Ok(OperationResult::error(reason).with_data(FILE_ID, file_id))
            }
            Removal::Removed => {
                info!(file_id = %file_id, filename = %asset.filename, delete_file, "File deleted");
                Ok(OperationResult::success().with_data(FILE_ID, file_id))
            }
        }
    }

    /// Move or rename files. See [`TransferOrchestrator::move_files`](crate::transfer::TransferOrchestrator::move_files).
    pub async fn move_files(&self, request: &MoveRequest) -> OperationResult {
        self.orchestrator.move_files(request).await
    }

    /// Rename a file in place, updating `asset` when the rename happened.
    pub async fn rename_file(
        &self,
        asset: &mut Asset,
        new_filename: &str,
        action: Option<ConflictResolution>,
    ) -> OperationResult {
        let Some(file_id) = asset.id else {
            return OperationResult::error("Can’t rename a file that has not been saved.");
        };

        let request = MoveRequest::new(vec![file_id], asset.folder_id)
            .rename(new_filename)
            .actions(vec![action]);
        let result = self.move_files(&request).await;

        let renamed = result.is_success() && result.data_item(SKIPPED).is_none();
        if let Some(filename) = result.filename().filter(|_| renamed) {
            asset.kind = AssetKind::from_filename(&filename);
            asset.filename = filename;
        }
        result
    }

    /// Store an upload in a folder, or settle a conflict a previous upload
    /// reported.
    pub async fn upload_file(&self, folder_id: FolderId, request: UploadRequest) -> OperationResult {
        match request {
            UploadRequest::Resolve(merge) => self.resolve_conflict(&merge).await,
            UploadRequest::Store(upload) => match self.folder_and_backend(folder_id).await {
                Ok((folder, backend)) => backend.upload_file(&folder, upload).await,
                Err(e) => e.into(),
            },
        }
    }

    pub async fn resolve_conflict(&self, merge: &MergeContext) -> OperationResult {
        self.resolver.resolve(merge).await
    }

    /// Store a file already on local disk. A conflict is settled right away
    /// when `resolution` is given, otherwise it is returned to the caller.
    pub async fn insert_file_by_local_path(
        &self,
        local_path: &Path,
        filename: &str,
        folder_id: FolderId,
        resolution: Option<ConflictResolution>,
    ) -> OperationResult {
        let (folder, backend) = match self.folder_and_backend(folder_id).await {
            Ok(found) => found,
            Err(e) => return e.into(),
        };

        let result = backend
            .insert_file_by_path(local_path, &folder, filename)
            .await;
        match resolution.and_then(|r| MergeContext::from_conflict(&result, r)) {
            Some(merge) => self.resolver.resolve(&merge).await,
            None => result,
        }
    }

    /// Public URL of a file, optionally of one of its transforms.
    ///
    /// Transforms only apply to manipulatable images. A transform that is
    /// not generated yet is either generated now or queued, depending on
    /// `generate_before_page_load`.
    pub async fn get_url_for_file(
        &self,
        asset: &Asset,
        transform: Option<&str>,
    ) -> AppResult<Option<String>> {
        let (folder, backend) = self.folder_and_backend(asset.folder_id).await?;
        let manipulatable = asset
            .extension()
            .is_some_and(|extension| is_image_manipulatable(&extension));

        let Some(transform) = transform.filter(|_| manipulatable) else {
            return Ok(backend.url_for_file(&folder, asset));
        };
        let transforms = &self.collaborators.transforms;
        let Some(index) = transforms.get_or_create_index(asset, transform).await? else {
            return Ok(backend.url_for_file(&folder, asset));
        };

        if index.file_exists {
            return transforms.url_for_index(&index).await.map(Some);
        }
        if self.transform_config.generate_before_page_load {
            transforms.generate(&index).await?;
            return transforms.url_for_index(&index).await.map(Some);
        }

        let tasks = &self.collaborators.tasks;
        if !tasks.has_pending(GENERATE_PENDING_TRANSFORMS).await? {
            tasks.enqueue(GENERATE_PENDING_TRANSFORMS).await?;
        }
        Ok(Some(format!(
            "{}/transforms/{}",
            self.transform_config.resource_base_url.trim_end_matches('/'),
            index.id
        )))
    }
}
