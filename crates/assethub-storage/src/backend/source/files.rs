//! File operations of [`SourceBackend`].

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::operation::{FILE_ID, FILENAME, NEW_FILENAME};
use assethub_core::OperationResult;
use assethub_entity::{Asset, AssetKind, ConflictResolution, Folder};

use super::{exists_prompt, Placement, SourceBackend};
use crate::backend::{StorageBackend, Upload};
use crate::media;

impl SourceBackend {
    pub(super) async fn upload_inner(
        &self,
        folder: &Folder,
        upload: Upload,
    ) -> AppResult<OperationResult> {
        let size = upload.data.len() as u64;
        if size > self.rules.max_upload_size {
            return Err(AppError::validation(format!(
                "“{}” is too large ({size} bytes, limit {}).",
                upload.filename, self.rules.max_upload_size
            )));
        }

        let scratch = self
            .scratch
            .materialize(&upload.filename, &upload.data)
            .await?;
        self.insert_inner(&scratch, folder, &upload.filename).await
    }

    /// Store a local file in `folder`. A taken name stores the file under a
    /// numbered name and reports a conflict.
    pub(super) async fn insert_inner(
        &self,
        local_path: &Path,
        folder: &Folder,
        raw_filename: &str,
    ) -> AppResult<OperationResult> {
        self.ensure_own(folder)?;
        let folder_id = folder.require_id()?;
        let filename = self.clean_filename(raw_filename)?;

        let taken = self.name_taken(folder, &filename, None).await?;
        let stored_name = if taken {
            self.available_name(folder, &filename).await?
        } else {
            filename.clone()
        };

        let mut asset = Asset::new(self.id(), folder_id, &stored_name);
        asset.title = Some(asset.default_title());
        asset.date_modified = Some(Utc::now());
        media::probe(local_path, asset.is_image())
            .await?
            .apply_to(&mut asset);
        reject_invalid(&asset)?;

        let key = Self::key(folder, &stored_name);
        self.provider.upload_from(local_path, &key).await?;
        let id = match self.assets.save(&asset).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(cleanup) = self.provider.delete(&key).await {
                    warn!(backend = %self.id(), key = %key, error = %cleanup, "Failed to remove bytes of an unsaved file");
                }
                return Err(e);
            }
        };

        if taken {
            info!(
                backend = %self.id(),
                file_id = %id,
                filename = %filename,
                stored_as = %stored_name,
                "Stored conflicting file under a new name"
            );
            return Ok(OperationResult::conflict(exists_prompt(&filename))
                .with_data(FILE_ID, id)
                .with_data(FILENAME, &filename)
                .with_data(NEW_FILENAME, &stored_name));
        }

        info!(backend = %self.id(), file_id = %id, filename = %stored_name, "Stored file");
        Ok(OperationResult::success()
            .with_data(FILE_ID, id)
            .with_data(FILENAME, &stored_name))
    }

    pub(super) async fn replace_inner(&self, target: &Asset, source: &Asset) -> AppResult<()> {
        let target_id = target.require_id()?;
        let target_folder = self.folder_of(target).await?;
        let source_folder = self.folder_of(source).await?;

        self.provider
            .copy(
                &Self::key(&source_folder, &source.filename),
                &Self::key(&target_folder, &target.filename),
            )
            .await?;

        let updated = Asset {
            size: source.size,
            width: source.width,
            height: source.height,
            date_modified: Some(Utc::now()),
            ..target.clone()
        };
        self.assets.save(&updated).await?;

        info!(backend = %self.id(), file_id = %target_id, source = %source.filename, "Replaced file contents");
        Ok(())
    }

    pub(super) async fn index_existing_inner(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>> {
        let folder_id = folder.require_id()?;
        if let Some(row) = self.assets.find_in_folder(folder_id, filename).await? {
            return Ok(Some(row));
        }
        let Some(mut asset) = self.describe_existing_inner(folder, filename).await? else {
            return Ok(None);
        };
        asset.id = Some(self.assets.save(&asset).await?);

        debug!(backend = %self.id(), filename = %filename, "Indexed file found on the medium");
        Ok(Some(asset))
    }

    /// An unsaved row describing the bytes stored for `filename`.
    pub(super) async fn describe_existing_inner(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>> {
        let folder_id = folder.require_id()?;
        let key = Self::key(folder, filename);
        if !self.provider.exists(&key).await? {
            return Ok(None);
        }

        let copy = self.scratch.reserve(filename).await?;
        self.provider.download_to(&key, &copy).await?;

        let mut asset = Asset::new(self.id(), folder_id, filename);
        asset.title = Some(asset.default_title());
        asset.date_modified = Some(Utc::now());
        media::probe(&copy, asset.is_image())
            .await?
            .apply_to(&mut asset);
        Ok(Some(asset))
    }

    pub(super) async fn move_inside_inner(
        &self,
        asset: &Asset,
        dest: &Folder,
        new_filename: &str,
        action: Option<ConflictResolution>,
    ) -> AppResult<OperationResult> {
        let id = asset.require_id()?;
        let dest_id = dest.require_id()?;
        let from = self.folder_of(asset).await?;

        let filename = match self.place(dest, new_filename, id, action).await? {
            Placement::Free(filename) => filename,
            Placement::Settled(result) => return Ok(result),
        };

        self.provider
            .rename(
                &Self::key(&from, &asset.filename),
                &Self::key(dest, &filename),
            )
            .await?;

        let moved = Asset {
            folder_id: dest_id,
            kind: AssetKind::from_filename(&filename),
            filename: filename.clone(),
            ..asset.clone()
        };
        self.assets.save(&moved).await?;

        info!(backend = %self.id(), file_id = %id, folder_id = %dest_id, filename = %filename, "Moved file");
        Ok(OperationResult::success()
            .with_data(FILE_ID, id)
            .with_data(FILENAME, &filename))
    }

    pub(super) async fn transfer_in_inner(
        &self,
        local_path: &Path,
        dest: &Folder,
        incoming: &Asset,
        action: Option<ConflictResolution>,
    ) -> AppResult<OperationResult> {
        self.ensure_own(dest)?;
        let id = incoming.require_id()?;
        let dest_id = dest.require_id()?;

        let filename = match self.place(dest, &incoming.filename, id, action).await? {
            Placement::Free(filename) => filename,
            Placement::Settled(result) => return Ok(result),
        };

        self.provider
            .upload_from(local_path, &Self::key(dest, &filename))
            .await?;

        let mut transferred = Asset {
            backend_id: self.id(),
            folder_id: dest_id,
            kind: AssetKind::from_filename(&filename),
            filename: filename.clone(),
            date_modified: Some(Utc::now()),
            ..incoming.clone()
        };
        media::probe(local_path, transferred.is_image())
            .await?
            .apply_to(&mut transferred);
        self.assets.save(&transferred).await?;

        info!(backend = %self.id(), file_id = %id, folder_id = %dest_id, filename = %filename, "Transferred file in");
        Ok(OperationResult::success()
            .with_data(FILE_ID, id)
            .with_data(FILENAME, &filename))
    }
}

fn reject_invalid(asset: &Asset) -> AppResult<()> {
    let errors = asset.field_errors();
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Err(AppError::validation(message))
}
