//! The asset service façade.
//!
//! Resolves folders and files through the index, routes work to the owning
//! backend, and fires lifecycle hooks. Storage logic lives in the backends,
//! merge logic in [`ConflictResolver`], and moves in [`TransferOrchestrator`].

mod files;
mod folders;
mod permissions;

use std::sync::Arc;

use tracing::{info, warn};

use assethub_core::config::{StorageConfig, TransformConfig};
use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::{AssetId, FolderId};
use assethub_database::{AssetStore, StoreTransaction, TransactionScope};
use assethub_entity::asset::FieldError;
use assethub_entity::naming::NamingOptions;
use assethub_entity::{Asset, Folder};
use assethub_index::{AssetIndex, FolderIndex, Uniqueness};
use assethub_storage::{BackendRegistry, StorageBackend};

use crate::collaborators::{
    MemoryTaskQueue, NoTransforms, PermissionChecker, StaticPermissions, TaskQueue,
    TransformProvider,
};
use crate::conflict::ConflictResolver;
use crate::hooks::{HookDispatcher, HookRegistry};
use crate::lifecycle::FileLifecycle;
use crate::transfer::TransferOrchestrator;

pub use files::UploadRequest;
pub use permissions::PermissionScope;

/// Subsystems the service calls out to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub transforms: Arc<dyn TransformProvider>,
    pub tasks: Arc<dyn TaskQueue>,
    pub permissions: Arc<dyn PermissionChecker>,
}

impl Default for Collaborators {
    /// No transforms, an in-memory queue, and no granted permissions.
    fn default() -> Self {
        Self {
            transforms: Arc::new(NoTransforms),
            tasks: Arc::new(MemoryTaskQueue::new()),
            permissions: Arc::new(StaticPermissions::default()),
        }
    }
}

/// Outcome of [`AssetService::store_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The row was written.
    Saved(AssetId),
    /// Field constraints failed; nothing was written.
    Invalid(Vec<FieldError>),
    /// A `before_save` handler vetoed the save; nothing was written.
    Vetoed { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Public entry point for folder and file operations.
#[derive(Debug, Clone)]
pub struct AssetService {
    registry: Arc<BackendRegistry>,
    folders: FolderIndex,
    assets: AssetIndex,
    hooks: HookDispatcher,
    lifecycle: FileLifecycle,
    collaborators: Collaborators,
    transform_config: TransformConfig,
    resolver: ConflictResolver,
    orchestrator: TransferOrchestrator,
}

impl AssetService {
    pub fn new(
        registry: Arc<BackendRegistry>,
        folders: FolderIndex,
        assets: AssetIndex,
        collaborators: Collaborators,
        storage: &StorageConfig,
        transforms: &TransformConfig,
    ) -> Self {
        let hooks = HookDispatcher::new(Arc::new(HookRegistry::new()));
        let lifecycle = FileLifecycle::new(
            registry.clone(),
            assets.clone(),
            hooks.clone(),
            collaborators.transforms.clone(),
        );
        let resolver = ConflictResolver::new(
            registry.clone(),
            folders.clone(),
            assets.clone(),
            lifecycle.clone(),
        );
        let orchestrator = TransferOrchestrator::new(
            registry.clone(),
            folders.clone(),
            assets.clone(),
            collaborators.transforms.clone(),
            NamingOptions::from(storage),
        );
        Self {
            registry,
            folders,
            assets,
            hooks,
            lifecycle,
            collaborators,
            transform_config: transforms.clone(),
            resolver,
            orchestrator,
        }
    }

    /// Lifecycle hook registry; register observers here.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        self.hooks.registry()
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn folder_index(&self) -> &FolderIndex {
        &self.folders
    }

    pub fn asset_index(&self) -> &AssetIndex {
        &self.assets
    }

    fn store(&self) -> &Arc<dyn AssetStore> {
        self.folders.backing_store()
    }

    /// Validate and persist a file row in a transaction of its own.
    ///
    /// Errors roll the transaction back and are returned as-is. To make the
    /// save part of a larger unit of work use [`store_file_in`](Self::store_file_in).
    pub async fn store_file(&self, asset: &mut Asset) -> AppResult<SaveOutcome> {
        self.store_file_with(asset, Uniqueness::Enforce).await
    }

    /// [`AssetService::store_file`] with an explicit filename uniqueness rule.
    pub async fn store_file_with(
        &self,
        asset: &mut Asset,
        uniqueness: Uniqueness,
    ) -> AppResult<SaveOutcome> {
        let tx = self.store().begin().await?;
        match self.store_file_in(tx.as_ref(), asset, uniqueness).await {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(e) => {
                tx.rollback().await.unwrap_or_else(|rollback| {
                    warn!(error = %rollback, "Rollback after failed save also failed");
                });
                Err(e)
            }
        }
    }

    /// Validate and persist a file row inside the caller's transaction.
    ///
    /// Nothing is committed or rolled back here; errors are returned so the
    /// caller can roll back the whole unit of work.
    pub async fn store_file_in(
        &self,
        tx: &dyn StoreTransaction,
        asset: &mut Asset,
        uniqueness: Uniqueness,
    ) -> AppResult<SaveOutcome> {
        let errors = AssetIndex::validate_in(tx, asset, uniqueness).await?;
        if !errors.is_empty() {
            return Ok(SaveOutcome::Invalid(errors));
        }
        if asset.title.is_none() {
            asset.title = Some(asset.default_title());
        }

        let outcome = self.lifecycle.save_in(tx, asset).await?;
        if let SaveOutcome::Saved(id) = &outcome {
            info!(file_id = %id, folder_id = %asset.folder_id, "File saved");
        }
        Ok(outcome)
    }

    /// A folder and the backend that owns it.
    async fn folder_and_backend(
        &self,
        folder_id: FolderId,
    ) -> AppResult<(Folder, Arc<dyn StorageBackend>)> {
        let folder = self
            .folders
            .get_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the folder!"))?;
        let backend = self.registry.get_backend(folder.backend_id)?;
        Ok((folder, backend))
    }

    async fn require_file(&self, file_id: AssetId) -> AppResult<Asset> {
        self.assets
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the file!"))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use assethub_core::events::{AssetEvent, AssetEventKind};
    use assethub_entity::AssetCriteria;

    use crate::hooks::{HookAction, HookHandler};
    use crate::test_support::Harness;

    #[derive(Debug)]
    struct Veto;

    #[async_trait]
    impl HookHandler for Veto {
        async fn handle(&self, _event: &AssetEvent) -> HookAction {
            HookAction::halt("Saving is disabled.")
        }

        fn name(&self) -> &str {
            "veto"
        }
    }

    #[tokio::test]
    async fn test_store_file_sets_default_title() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "docs").await;
        let mut asset = Asset::new(h.local, folder.id.unwrap(), "annual_report.pdf");

        let outcome = h.service.store_file(&mut asset).await.unwrap();

        assert!(outcome.is_saved());
        assert_eq!(asset.title.as_deref(), Some("annual report"));
        assert!(h.assets.get_by_id(asset.id.unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_file_reports_field_errors_without_writing() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "docs").await;
        let mut asset = Asset::new(h.local, folder.id.unwrap(), "a.pdf");
        asset.size = -1;

        let outcome = h.service.store_file(&mut asset).await.unwrap();

        let SaveOutcome::Invalid(errors) = outcome else {
            panic!("expected field errors");
        };
        assert_eq!(errors[0].field, "size");
        assert_eq!(h.assets.count(&AssetCriteria::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_file_rejects_duplicate_name() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "docs").await;
        let mut first = Asset::new(h.local, folder.id.unwrap(), "a.pdf");
        h.service.store_file(&mut first).await.unwrap();

        let mut second = Asset::new(h.local, folder.id.unwrap(), "a.pdf");
        let outcome = h.service.store_file(&mut second).await.unwrap();
        assert!(matches!(outcome, SaveOutcome::Invalid(_)));

        let relaxed = h
            .service
            .store_file_with(&mut second, Uniqueness::Relaxed)
            .await
            .unwrap();
        assert!(relaxed.is_saved());
    }

    #[tokio::test]
    async fn test_vetoed_save_writes_nothing() {
        let h = Harness::new().await;
        h.hooks
            .register(AssetEventKind::BeforeSave, Arc::new(Veto))
            .await;
        let folder = h.folder(h.local, "docs").await;
        let mut asset = Asset::new(h.local, folder.id.unwrap(), "a.pdf");

        let outcome = h.service.store_file(&mut asset).await.unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::Vetoed {
                reason: "Saving is disabled.".to_string()
            }
        );
        assert!(asset.id.is_none());
        assert_eq!(h.assets.count(&AssetCriteria::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_file_in_leaves_commit_to_caller() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "docs").await;
        let mut asset = Asset::new(h.local, folder.id.unwrap(), "a.pdf");

        let tx = h.store.begin().await.unwrap();
        let outcome = h
            .service
            .store_file_in(tx.as_ref(), &mut asset, Uniqueness::Enforce)
            .await
            .unwrap();
        assert!(outcome.is_saved());
        assert!(h.assets.get_by_id(asset.id.unwrap()).await.unwrap().is_none());

        let mut twin = Asset::new(h.local, folder.id.unwrap(), "a.pdf");
        let clash = h
            .service
            .store_file_in(tx.as_ref(), &mut twin, Uniqueness::Enforce)
            .await
            .unwrap();
        assert!(matches!(clash, SaveOutcome::Invalid(_)));

        tx.rollback().await.unwrap();
        assert!(h.assets.get_by_id(asset.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_store_file_calls_all_commit() {
        let h = Harness::new().await;
        let folder_id = h.folder(h.local, "docs").await.id.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let service = h.service.clone();
            let backend = h.local;
            handles.push(tokio::spawn(async move {
                let mut asset = Asset::new(backend, folder_id, format!("file_{i}.pdf"));
                service.store_file(&mut asset).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_saved());
        }

        let count = h
            .assets
            .count(&AssetCriteria::default().folder(folder_id))
            .await
            .unwrap();
        assert_eq!(count, 32);
    }

    #[tokio::test]
    async fn test_failed_store_file_keeps_other_writes() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "docs").await;
        let mut kept = Asset::new(h.local, folder.id.unwrap(), "kept.pdf");
        h.service.store_file(&mut kept).await.unwrap();

        let mut orphan = Asset::new(h.local, FolderId::new(), "orphan.pdf");
        assert!(h.service.store_file(&mut orphan).await.is_err());

        assert!(h.assets.get_by_id(kept.id.unwrap()).await.unwrap().is_some());
        assert_eq!(h.assets.count(&AssetCriteria::default()).await.unwrap(), 1);
    }
}
