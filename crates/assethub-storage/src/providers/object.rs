//! Object-store provider.
//!
//! Object stores have no real directories. A directory is represented by a
//! zero-length marker object whose key ends with `/`, and exists while the
//! marker or any key below it exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::traits::StorageProvider;

/// Minimal key/value client for an object store bucket.
#[async_trait]
pub trait ObjectClient: Send + Sync + std::fmt::Debug + 'static {
    /// Store an object, replacing any existing one.
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Fetch an object. A missing key is a not-found error.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Remove an object. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Server-side copy.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Whether an object exists under exactly this key.
    async fn head(&self, key: &str) -> AppResult<bool>;

    /// Every key starting with `prefix`.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;
}

/// [`StorageProvider`] over any [`ObjectClient`].
#[derive(Debug, Clone)]
pub struct ObjectStoreProvider {
    client: Arc<dyn ObjectClient>,
    prefix: String,
}

impl ObjectStoreProvider {
    /// Create a provider storing every key under `prefix`.
    pub fn new(client: Arc<dyn ObjectClient>, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into().trim_matches('/').to_string();
        if !prefix.is_empty() {
            prefix.push('/');
        }
        Self { client, prefix }
    }

    fn key(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    fn dir_key(&self, path: &str) -> String {
        let key = self.key(path);
        if key.is_empty() || key.ends_with('/') {
            key
        } else {
            format!("{key}/")
        }
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn provider_type(&self) -> &str {
        "object"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.client.list(&self.prefix).await.is_ok())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.client.get(&self.key(path)).await
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let bytes = data.len();
        self.client.put(&self.key(path), data).await?;
        debug!(path, bytes, "Wrote object");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.client.delete(&self.key(path)).await
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        let dir = self.dir_key(path);
        for key in self.client.list(&dir).await? {
            self.client.delete(&key).await?;
        }
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.client.copy(&self.key(from), &self.key(to)).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let (from, to) = (self.key(from), self.key(to));
        if from == to {
            return Ok(());
        }
        self.client.copy(&from, &to).await?;
        self.client.delete(&from).await
    }

    async fn rename_dir(&self, from: &str, to: &str) -> AppResult<()> {
        let (from, to) = (self.dir_key(from), self.dir_key(to));
        let keys = self.client.list(&from).await?;
        if keys.is_empty() {
            return Err(AppError::not_found(format!("Directory not found: {from}")));
        }
        for key in keys {
            let target = format!("{to}{}", &key[from.len()..]);
            self.client.copy(&key, &target).await?;
            self.client.delete(&key).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        if path.ends_with('/') || path.is_empty() {
            return Ok(false);
        }
        self.client.head(&self.key(path)).await
    }

    async fn dir_exists(&self, path: &str) -> AppResult<bool> {
        let dir = self.dir_key(path);
        if dir == self.prefix {
            return Ok(true);
        }
        Ok(!self.client.list(&dir).await?.is_empty())
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        let dir = self.dir_key(path);
        if dir.is_empty() {
            return Ok(());
        }
        self.client.put(&dir, Bytes::new()).await
    }
}

/// Bucket held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectClient {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, directory markers included.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let mut objects = self.objects.write().await;
        let data = objects
            .get(from)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Object not found: {from}")))?;
        objects.insert(to.to_string(), data);
        Ok(())
    }

    async fn head(&self, key: &str) -> AppResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
