//! Shared fixture: the full service over an in-memory store with a local,
//! an object, and a staging backend.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use assethub_core::config::{
    BackendConfig, BackendKind, IndexConfig, StorageConfig, TransformConfig,
};
use assethub_core::traits::StorageProvider;
use assethub_core::types::{BackendId, FolderId};
use assethub_core::OperationResult;
use assethub_database::{AssetStore, MemoryStore};
use assethub_entity::naming::NamingOptions;
use assethub_entity::Folder;
use assethub_index::{AssetIndex, FolderIndex};
use assethub_storage::providers::{LocalStorageProvider, MemoryObjectClient, ObjectStoreProvider};
use assethub_storage::{BackendRegistry, SourceBackend, StorageBackend, Upload};

use crate::assets::{AssetService, Collaborators};
use crate::collaborators::{
    MemoryTaskQueue, NoTransforms, PermissionChecker, StaticPermissions, TransformProvider,
};
use crate::conflict::ConflictResolver;
use crate::hooks::{HookDispatcher, HookRegistry};
use crate::lifecycle::FileLifecycle;
use crate::transfer::TransferOrchestrator;

pub struct Harness {
    pub dir: TempDir,
    pub store: MemoryStore,
    pub folders: FolderIndex,
    pub assets: AssetIndex,
    pub storage: StorageConfig,
    pub registry: Arc<BackendRegistry>,
    pub providers: HashMap<BackendId, Arc<dyn StorageProvider>>,
    pub tasks: Arc<MemoryTaskQueue>,
    pub transforms: Arc<dyn TransformProvider>,
    pub transform_config: TransformConfig,
    pub service: AssetService,
    pub hooks: Arc<HookRegistry>,
    pub local: BackendId,
    pub object: BackendId,
    pub staging: BackendId,
}

fn backend_config(name: &str, kind: BackendKind, sort_order: i32) -> BackendConfig {
    BackendConfig {
        id: BackendId::new(),
        name: name.to_string(),
        kind,
        sort_order,
        root_path: None,
        bucket: None,
        endpoint: None,
        region: None,
        url_base: Some(format!("https://cdn.example.com/{}", name.to_lowercase())),
    }
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_transforms(Arc::new(NoTransforms), TransformConfig::default()).await
    }

    pub async fn with_transforms(
        transforms: Arc<dyn TransformProvider>,
        transform_config: TransformConfig,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let shared: Arc<dyn AssetStore> = Arc::new(store.clone());
        let storage = StorageConfig {
            scratch_dir: dir.path().join("scratch").to_string_lossy().to_string(),
            ..StorageConfig::default()
        };
        let folders = FolderIndex::new(shared.clone(), &IndexConfig::default());
        let assets = AssetIndex::new(shared);

        let root = |name: &str| dir.path().join(name).to_string_lossy().to_string();
        let local_provider: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(&root("uploads")).await.unwrap());
        let staging_provider: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::staging(&root("staging")).await.unwrap());
        let object_provider: Arc<dyn StorageProvider> = Arc::new(ObjectStoreProvider::new(
            Arc::new(MemoryObjectClient::new()),
            "media",
        ));

        let mut registry = BackendRegistry::new();
        let mut providers = HashMap::new();
        let mut ids = Vec::new();
        for (config, provider) in [
            (backend_config("Temp", BackendKind::Staging, 0), staging_provider),
            (backend_config("Uploads", BackendKind::Local, 1), local_provider),
            (backend_config("Media", BackendKind::Object, 2), object_provider),
        ] {
            ids.push(config.id);
            providers.insert(config.id, provider.clone());
            registry.register(Arc::new(SourceBackend::new(
                config,
                provider,
                folders.clone(),
                assets.clone(),
                &storage,
            )));
        }
        let registry = Arc::new(registry);
        registry.ensure_root_folders().await.unwrap();

        let tasks = Arc::new(MemoryTaskQueue::new());
        let collaborators = Collaborators {
            transforms: transforms.clone(),
            tasks: tasks.clone(),
            permissions: Arc::new(StaticPermissions::allow_all()),
        };
        let service = AssetService::new(
            registry.clone(),
            folders.clone(),
            assets.clone(),
            collaborators,
            &storage,
            &transform_config,
        );

        Self {
            hooks: service.hooks().clone(),
            service,
            dir,
            store,
            folders,
            assets,
            storage,
            registry,
            providers,
            tasks,
            transforms,
            transform_config,
            staging: ids[0],
            local: ids[1],
            object: ids[2],
        }
    }

    /// Rebuild the service with another permission checker. Registered hooks
    /// are dropped along with the old service.
    pub fn set_permissions(&mut self, permissions: Arc<dyn PermissionChecker>) {
        self.service = AssetService::new(
            self.registry.clone(),
            self.folders.clone(),
            self.assets.clone(),
            Collaborators {
                transforms: self.transforms.clone(),
                tasks: self.tasks.clone(),
                permissions,
            },
            &self.storage,
            &self.transform_config,
        );
        self.hooks = self.service.hooks().clone();
    }

    pub fn lifecycle(&self) -> FileLifecycle {
        FileLifecycle::new(
            self.registry.clone(),
            self.assets.clone(),
            HookDispatcher::new(self.hooks.clone()),
            self.transforms.clone(),
        )
    }

    pub fn resolver(&self) -> ConflictResolver {
        ConflictResolver::new(
            self.registry.clone(),
            self.folders.clone(),
            self.assets.clone(),
            self.lifecycle(),
        )
    }

    pub fn orchestrator(&self) -> TransferOrchestrator {
        TransferOrchestrator::new(
            self.registry.clone(),
            self.folders.clone(),
            self.assets.clone(),
            self.transforms.clone(),
            NamingOptions::from(&self.storage),
        )
    }

    pub fn backend(&self, id: BackendId) -> Arc<dyn StorageBackend> {
        self.registry.get_backend(id).unwrap()
    }

    pub fn provider(&self, id: BackendId) -> Arc<dyn StorageProvider> {
        self.providers[&id].clone()
    }

    /// Id of a backend's top-level folder.
    pub async fn root(&self, id: BackendId) -> FolderId {
        self.backend(id).root_folder().await.unwrap().id.unwrap()
    }

    /// Create a folder below a backend's top-level folder.
    pub async fn folder(&self, id: BackendId, name: &str) -> Folder {
        let backend = self.backend(id);
        let root = backend.root_folder().await.unwrap();
        let folder_id = backend.create_folder(&root, name).await.folder_id().unwrap();
        self.folders.get_by_id(folder_id).await.unwrap().unwrap()
    }

    pub async fn upload(&self, folder: &Folder, filename: &str, content: &str) -> OperationResult {
        self.backend(folder.backend_id)
            .upload_file(folder, Upload::new(filename, Bytes::from(content.to_string())))
            .await
    }

    pub async fn read(&self, id: BackendId, key: &str) -> Bytes {
        self.provider(id).read_bytes(key).await.unwrap()
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.storage.scratch_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
