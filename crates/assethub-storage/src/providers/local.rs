//! Local filesystem storage provider.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_core::traits::StorageProvider;

/// Files under a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    root: PathBuf,
    label: &'static str,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        Self::with_label(root_path, "local").await
    }

    /// A provider for a staging area of temporary uploads.
    pub async fn staging(root_path: &str) -> AppResult<Self> {
        Self::with_label(root_path, "staging").await
    }

    async fn with_label(root_path: &str, label: &'static str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root, label })
    }

    /// Root directory of this provider.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

fn io_error(action: &str, path: &str) -> impl FnOnce(io::Error) -> AppError + use<> {
    let message = format!("Failed to {action}: {path}");
    move |e| {
        if e.kind() == io::ErrorKind::NotFound {
            AppError::not_found(message)
        } else {
            AppError::with_source(ErrorKind::Storage, message, e)
        }
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        self.label
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let data = fs::read(self.resolve(path))
            .await
            .map_err(io_error("read file", path))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path);
        self.ensure_parent(&full_path).await?;
        fs::write(&full_path, &data)
            .await
            .map_err(io_error("write file", path))?;

        debug!(path, bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        match fs::remove_file(self.resolve(path)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(io_error("delete file", path)(e))
            }
            _ => Ok(()),
        }
    }

    async fn delete_dir(&self, path: &str) -> AppResult<()> {
        match fs::remove_dir_all(self.resolve(path)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(io_error("delete directory", path)(e))
            }
            _ => Ok(()),
        }
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let to_path = self.resolve(to);
        self.ensure_parent(&to_path).await?;
        fs::copy(self.resolve(from), &to_path)
            .await
            .map_err(io_error("copy file", &format!("{from} -> {to}")))?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let to_path = self.resolve(to);
        self.ensure_parent(&to_path).await?;
        fs::rename(self.resolve(from), &to_path)
            .await
            .map_err(io_error("rename", &format!("{from} -> {to}")))?;
        Ok(())
    }

    async fn rename_dir(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from.trim_end_matches('/'));
        let to_path = self.resolve(to.trim_end_matches('/'));
        self.ensure_parent(&to_path).await?;
        fs::rename(&from_path, &to_path)
            .await
            .map_err(io_error("rename directory", &format!("{from} -> {to}")))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn dir_exists(&self, path: &str) -> AppResult<bool> {
        Ok(fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn create_dir(&self, path: &str) -> AppResult<()> {
        fs::create_dir_all(self.resolve(path))
            .await
            .map_err(io_error("create directory", path))
    }

    async fn download_to(&self, path: &str, local: &Path) -> AppResult<u64> {
        fs::copy(self.resolve(path), local)
            .await
            .map_err(io_error("copy to local path", path))
    }

    async fn upload_from(&self, local: &Path, path: &str) -> AppResult<u64> {
        let full_path = self.resolve(path);
        self.ensure_parent(&full_path).await?;
        fs::copy(local, &full_path)
            .await
            .map_err(io_error("copy from local path", &local.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn provider() -> (tempfile::TempDir, LocalStorageProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let (_dir, provider) = provider().await;

        let data = Bytes::from("hello world");
        provider.write("photos/file.txt", data.clone()).await.unwrap();
        assert!(provider.exists("photos/file.txt").await.unwrap());
        assert!(provider.dir_exists("photos/").await.unwrap());
        assert!(!provider.exists("photos/").await.unwrap());

        assert_eq!(provider.read_bytes("photos/file.txt").await.unwrap(), data);

        provider.delete("photos/file.txt").await.unwrap();
        assert!(!provider.exists("photos/file.txt").await.unwrap());
        provider.delete("photos/file.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, provider) = provider().await;
        let err = provider.read_bytes("nope.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rename_dir_moves_contents() {
        let (_dir, provider) = provider().await;
        provider.write("a/b/c.txt", Bytes::from("c")).await.unwrap();

        provider.rename_dir("a/", "z/").await.unwrap();
        assert!(!provider.dir_exists("a/").await.unwrap());
        assert!(provider.exists("z/b/c.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_round_trip_through_paths() {
        let (dir, provider) = provider().await;
        let local = dir.path().join("outside.bin");
        tokio::fs::write(&local, b"payload").await.unwrap();

        assert_eq!(provider.upload_from(&local, "in/stored.bin").await.unwrap(), 7);
        let copy = dir.path().join("copy.bin");
        provider.download_to("in/stored.bin", &copy).await.unwrap();
        assert_eq!(tokio::fs::read(&copy).await.unwrap(), b"payload");
    }
}
