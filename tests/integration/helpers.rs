//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use assethub_core::OperationResult;
use assethub_core::config::{BackendConfig, BackendKind, IndexConfig, StorageConfig, TransformConfig};
use assethub_core::types::BackendId;
use assethub_database::{AssetStore, MemoryStore};
use assethub_entity::Folder;
use assethub_index::{AssetIndex, FolderIndex};
use assethub_service::{AssetService, Collaborators, UploadRequest};
use assethub_storage::{BackendRegistry, Upload};

/// Test application context: two disk backends and a staging area over an
/// in-memory index.
pub struct TestApp {
    pub dir: TempDir,
    pub store: MemoryStore,
    pub storage: StorageConfig,
    pub service: AssetService,
    pub archive: BackendId,
    pub uploads: BackendId,
    pub staging: BackendId,
}

fn backend(dir: &TempDir, name: &str, kind: BackendKind, sort_order: i32) -> BackendConfig {
    BackendConfig {
        id: BackendId::new(),
        name: name.to_string(),
        kind,
        sort_order,
        root_path: Some(dir.path().join(name).to_string_lossy().to_string()),
        bucket: None,
        endpoint: None,
        region: None,
        url_base: None,
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let staging = backend(&dir, "staging", BackendKind::Staging, 0);
        let uploads = backend(&dir, "uploads", BackendKind::Local, 1);
        let archive = backend(&dir, "archive", BackendKind::Local, 2);
        let storage = StorageConfig {
            scratch_dir: dir.path().join("scratch").to_string_lossy().to_string(),
            backends: vec![staging.clone(), uploads.clone(), archive.clone()],
            ..StorageConfig::default()
        };

        let store = MemoryStore::new();
        let shared: Arc<dyn AssetStore> = Arc::new(store.clone());
        let folders = FolderIndex::new(shared.clone(), &IndexConfig::default());
        let assets = AssetIndex::new(shared);

        let registry = BackendRegistry::from_config(&storage, &folders, &assets)
            .await
            .expect("Failed to build backends");
        registry
            .ensure_root_folders()
            .await
            .expect("Failed to create root folders");

        let service = AssetService::new(
            Arc::new(registry),
            folders,
            assets,
            Collaborators::default(),
            &storage,
            &TransformConfig::default(),
        );

        Self {
            dir,
            store,
            storage,
            service,
            archive: archive.id,
            uploads: uploads.id,
            staging: staging.id,
        }
    }

    /// Create a folder below a backend's top-level folder.
    pub async fn folder(&self, backend_id: BackendId, name: &str) -> Folder {
        let root = self
            .service
            .registry()
            .get_backend(backend_id)
            .expect("backend")
            .root_folder()
            .await
            .expect("root folder");
        let created = self.service.create_folder(root.id.expect("root id"), name).await;
        let id = created.folder_id().expect("folder created");
        self.service
            .get_folder_by_id(id)
            .await
            .expect("lookup")
            .expect("folder exists")
    }

    /// Upload text content through the service.
    pub async fn upload(&self, folder: &Folder, filename: &str, content: &str) -> OperationResult {
        self.service
            .upload_file(
                folder.id.expect("folder id"),
                UploadRequest::Store(Upload::new(filename, Bytes::from(content.to_string()))),
            )
            .await
    }

    /// Read a stored file straight from disk.
    pub fn read(&self, backend: &str, key: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(backend).join(key)).unwrap_or_default()
    }

    pub fn exists(&self, backend: &str, key: &str) -> bool {
        self.dir.path().join(backend).join(key).exists()
    }

    /// Files left in the scratch directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.storage.scratch_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
