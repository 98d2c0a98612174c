//! Hook-wrapped row saves and file deletes.
//!
//! The façade and the conflict resolver both go through [`FileLifecycle`],
//! so a file row is never written or removed without its `before_*` and
//! `after_*` hooks.

use std::sync::Arc;

use tracing::debug;

use assethub_core::events::AssetEvent;
use assethub_core::result::AppResult;
use assethub_database::AssetRepository;
use assethub_entity::Asset;
use assethub_index::AssetIndex;
use assethub_storage::BackendRegistry;

use crate::assets::SaveOutcome;
use crate::collaborators::TransformProvider;
use crate::hooks::HookDispatcher;

/// Outcome of [`FileLifecycle::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed,
    /// A `before_delete` handler vetoed; nothing was touched.
    Vetoed(String),
}

#[derive(Debug, Clone)]
pub struct FileLifecycle {
    registry: Arc<BackendRegistry>,
    assets: AssetIndex,
    hooks: HookDispatcher,
    transforms: Arc<dyn TransformProvider>,
}

impl FileLifecycle {
    pub fn new(
        registry: Arc<BackendRegistry>,
        assets: AssetIndex,
        hooks: HookDispatcher,
        transforms: Arc<dyn TransformProvider>,
    ) -> Self {
        Self {
            registry,
            assets,
            hooks,
            transforms,
        }
    }

    pub fn hooks(&self) -> &HookDispatcher {
        &self.hooks
    }

    /// Write `asset` through `repo` between `before_save` and `after_save`.
    /// Sets `asset.id` once written. No validation happens here.
    pub async fn save_in<R>(&self, repo: &R, asset: &mut Asset) -> AppResult<SaveOutcome>
    where
        R: AssetRepository + ?Sized,
    {
        let is_new = asset.id.is_none();
        let before = self
            .hooks
            .dispatch(&AssetEvent::BeforeSave {
                asset: asset.as_ref_event(),
                is_new,
            })
            .await;
        if before.halted {
            return Ok(SaveOutcome::Vetoed {
                reason: before.reason(),
            });
        }

        let id = AssetIndex::save_in(repo, asset).await?;
        asset.id = Some(id);

        self.hooks
            .notify(&AssetEvent::AfterSave {
                asset: asset.as_ref_event(),
                is_new,
            })
            .await;

        Ok(SaveOutcome::Saved(id))
    }

    /// Remove a file row between `before_delete` and `after_delete`.
    ///
    /// With `delete_file` the stored bytes and every transform go first.
    pub async fn remove(&self, asset: &Asset, delete_file: bool) -> AppResult<Removal> {
        let id = asset.require_id()?;
        let before = self
            .hooks
            .dispatch(&AssetEvent::BeforeDelete {
                asset: asset.as_ref_event(),
            })
            .await;
        if before.halted {
            return Ok(Removal::Vetoed(before.reason()));
        }

        if delete_file {
            let backend = self.registry.get_backend(asset.backend_id)?;
            backend.delete_file(asset).await?;
            self.transforms.delete_all_transform_data(asset).await?;
        }
        self.assets.delete(id).await?;

        self.hooks
            .notify(&AssetEvent::AfterDelete {
                asset: asset.as_ref_event(),
            })
            .await;

        debug!(file_id = %id, delete_file, "File row removed");
        Ok(Removal::Removed)
    }
}
