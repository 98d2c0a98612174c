//! Backend registry: routes operations to the backend owning an id.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use assethub_core::config::{BackendConfig, BackendKind, StorageConfig};
use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::traits::StorageProvider;
use assethub_core::types::BackendId;
use assethub_index::{AssetIndex, FolderIndex};

use crate::backend::{SourceBackend, StorageBackend};
use crate::providers::LocalStorageProvider;

/// Every configured backend, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendId, Arc<dyn StorageBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend for every configured entry.
    pub async fn from_config(
        storage: &StorageConfig,
        folders: &FolderIndex,
        assets: &AssetIndex,
    ) -> AppResult<Self> {
        let mut registry = Self::new();
        for config in &storage.backends {
            let provider = build_provider(config).await?;
            let backend = SourceBackend::new(
                config.clone(),
                provider,
                folders.clone(),
                assets.clone(),
                storage,
            );
            registry.register(Arc::new(backend));
        }
        Ok(registry)
    }

    /// Register a backend, replacing any with the same id.
    pub fn register(&mut self, backend: Arc<dyn StorageBackend>) {
        info!(backend = %backend.id(), name = %backend.config().name, kind = ?backend.kind(), "Registered backend");
        self.backends.insert(backend.id(), backend);
    }

    /// Look up a backend by id.
    pub fn get_backend(&self, id: BackendId) -> AppResult<Arc<dyn StorageBackend>> {
        self.backends
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Backend {id} not found")))
    }

    /// Configuration of a backend.
    pub fn get_backend_config(&self, id: BackendId) -> AppResult<&BackendConfig> {
        self.backends
            .get(&id)
            .map(|backend| backend.config())
            .ok_or_else(|| AppError::not_found(format!("Backend {id} not found")))
    }

    /// Sort position of a backend's tree. Unknown backends sort last.
    pub fn sort_order(&self, id: BackendId) -> i32 {
        self.backends
            .get(&id)
            .map_or(i32::MAX, |backend| backend.config().sort_order)
    }

    /// The first staging backend, if one is configured.
    pub fn staging_backend(&self) -> Option<Arc<dyn StorageBackend>> {
        let mut staging: Vec<&Arc<dyn StorageBackend>> = self
            .backends
            .values()
            .filter(|backend| backend.kind() == BackendKind::Staging)
            .collect();
        staging.sort_by_key(|backend| backend.config().sort_order);
        staging.first().map(|backend| Arc::clone(*backend))
    }

    /// Registered ids in sort order.
    pub fn ids(&self) -> Vec<BackendId> {
        let mut ids: Vec<BackendId> = self.backends.keys().copied().collect();
        ids.sort_by_key(|id| (self.sort_order(*id), *id));
        ids
    }

    /// Make sure every backend has its top-level folder.
    pub async fn ensure_root_folders(&self) -> AppResult<()> {
        for id in self.ids() {
            self.get_backend(id)?.root_folder().await?;
        }
        Ok(())
    }
}

async fn build_provider(config: &BackendConfig) -> AppResult<Arc<dyn StorageProvider>> {
    let root = || {
        config.root_path.as_deref().ok_or_else(|| {
            AppError::configuration(format!("Backend '{}' has no root_path", config.name))
        })
    };

    match config.kind {
        BackendKind::Local => Ok(Arc::new(LocalStorageProvider::new(root()?).await?)),
        BackendKind::Staging => Ok(Arc::new(LocalStorageProvider::staging(root()?).await?)),
        BackendKind::Object => object_provider(config).await,
    }
}

#[cfg(feature = "s3")]
async fn object_provider(config: &BackendConfig) -> AppResult<Arc<dyn StorageProvider>> {
    use crate::providers::ObjectStoreProvider;
    use crate::providers::s3::S3ObjectClient;

    let client = S3ObjectClient::connect(config).await?;
    let prefix = config.root_path.clone().unwrap_or_default();
    Ok(Arc::new(ObjectStoreProvider::new(Arc::new(client), prefix)))
}

#[cfg(not(feature = "s3"))]
async fn object_provider(config: &BackendConfig) -> AppResult<Arc<dyn StorageProvider>> {
    Err(AppError::configuration(format!(
        "Backend '{}' needs object storage; rebuild with the `s3` feature",
        config.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assethub_core::config::IndexConfig;
    use assethub_database::{AssetStore, MemoryStore};

    fn backend(name: &str, kind: BackendKind, sort_order: i32, root: &std::path::Path) -> BackendConfig {
        BackendConfig {
            id: BackendId::new(),
            name: name.to_string(),
            kind,
            sort_order,
            root_path: Some(root.join(name).to_string_lossy().to_string()),
            bucket: None,
            endpoint: None,
            region: None,
            url_base: None,
        }
    }

    #[tokio::test]
    async fn test_from_config_orders_and_finds_staging() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = backend("Uploads", BackendKind::Local, 2, dir.path());
        let temp = backend("Temp", BackendKind::Staging, 1, dir.path());
        let storage = StorageConfig {
            backends: vec![uploads.clone(), temp.clone()],
            ..StorageConfig::default()
        };
        let store: Arc<dyn AssetStore> = Arc::new(MemoryStore::new());
        let folders = FolderIndex::new(store.clone(), &IndexConfig::default());
        let assets = AssetIndex::new(store);

        let registry = BackendRegistry::from_config(&storage, &folders, &assets)
            .await
            .unwrap();

        assert_eq!(registry.ids(), vec![temp.id, uploads.id]);
        assert_eq!(registry.staging_backend().map(|b| b.id()), Some(temp.id));
        assert_eq!(registry.sort_order(BackendId::new()), i32::MAX);
        assert!(registry.get_backend(BackendId::new()).is_err());

        registry.ensure_root_folders().await.unwrap();
        let root = registry.get_backend(uploads.id).unwrap().root_folder().await.unwrap();
        assert_eq!(root.name, "Uploads");
        assert!(root.is_top_level());
    }
}
