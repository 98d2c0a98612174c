//! Asset row queries, validation, and writes.

use std::sync::Arc;

use tracing::debug;

use assethub_core::result::AppResult;
use assethub_core::types::{AssetId, FolderId};
use assethub_database::{AssetRepository, AssetStore};
use assethub_entity::asset::FieldError;
use assethub_entity::{Asset, AssetCriteria};

/// Whether a write must keep filenames unique within a folder.
///
/// Passed per call so that relaxing the check for one merge never affects
/// an unrelated concurrent write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Uniqueness {
    /// Reject a second asset with the same filename in the folder.
    #[default]
    Enforce,
    /// Allow the duplicate; used while a conflict is being merged.
    Relaxed,
}

/// Query and write access to asset rows.
#[derive(Debug, Clone)]
pub struct AssetIndex {
    store: Arc<dyn AssetStore>,
}

impl AssetIndex {
    /// Create an index over a store.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, id: AssetId) -> AppResult<Option<Asset>> {
        self.find_one(&AssetCriteria::by_id(id)).await
    }

    pub async fn find(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        self.store.find_assets(criteria).await
    }

    pub async fn find_one(&self, criteria: &AssetCriteria) -> AppResult<Option<Asset>> {
        let criteria = criteria.clone().limit(1);
        Ok(self.store.find_assets(&criteria).await?.into_iter().next())
    }

    pub async fn count(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        self.store.count_assets(criteria).await
    }

    /// The asset in `folder_id` named exactly `filename`, if any.
    pub async fn find_in_folder(
        &self,
        folder_id: FolderId,
        filename: &str,
    ) -> AppResult<Option<Asset>> {
        self.find_one(&AssetCriteria::default().folder(folder_id).filename(filename))
            .await
    }

    /// Field-level constraint failures plus, when enforced, a filename clash
    /// with another asset of the same folder.
    pub async fn validate(
        &self,
        asset: &Asset,
        uniqueness: Uniqueness,
    ) -> AppResult<Vec<FieldError>> {
        Self::validate_in(self.store.as_ref(), asset, uniqueness).await
    }

    /// [`validate`](Self::validate) against `repo`, typically an open
    /// transaction, so its uncommitted rows count as clashes.
    pub async fn validate_in<R>(
        repo: &R,
        asset: &Asset,
        uniqueness: Uniqueness,
    ) -> AppResult<Vec<FieldError>>
    where
        R: AssetRepository + ?Sized,
    {
        let mut errors = asset.field_errors();

        if uniqueness == Uniqueness::Enforce {
            let clash = repo
                .find_assets(
                    &AssetCriteria::default()
                        .folder(asset.folder_id)
                        .filename(&asset.filename),
                )
                .await?
                .into_iter()
                .any(|other| other.id != asset.id);
            if clash {
                errors.push(FieldError {
                    field: "filename".to_string(),
                    message: format!(
                        "A file with the name “{}” already exists in the folder.",
                        asset.filename
                    ),
                });
            }
        }

        Ok(errors)
    }

    /// Write the row and return its id. No validation happens here.
    pub async fn save(&self, asset: &Asset) -> AppResult<AssetId> {
        Self::save_in(self.store.as_ref(), asset).await
    }

    /// [`save`](Self::save) through `repo`.
    pub async fn save_in<R>(repo: &R, asset: &Asset) -> AppResult<AssetId>
    where
        R: AssetRepository + ?Sized,
    {
        let id = repo.save_asset(asset).await?;
        debug!(asset_id = %id, folder_id = %asset.folder_id, filename = %asset.filename, "Asset row saved");
        Ok(id)
    }

    /// The store behind the index.
    pub fn backing_store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Remove a row. Returns whether it existed.
    pub async fn delete(&self, id: AssetId) -> AppResult<bool> {
        self.store.delete_asset(id).await
    }

    /// Remove every row inside the given folders.
    pub async fn delete_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64> {
        self.store.delete_assets_in_folders(folder_ids).await
    }
}
