//! Byte-level storage provider trait implemented by each storage medium.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Trait for byte-level storage media.
///
/// Paths are relative, slash-delimited and never start with `/`. A
/// directory path ends with `/` (the backend root is the empty string).
/// Implementations exist for the local filesystem and for object stores
/// in `assethub-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "object").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read a file into memory as a complete byte vector.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write bytes to a file at the given path, replacing any existing file.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete a directory and all its contents recursively.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Copy a file from one path to another within this provider.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Move a file from one path to another within this provider.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// Move a directory and everything below it.
    async fn rename_dir(&self, from: &str, to: &str) -> AppResult<()>;

    /// Check whether a file exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Check whether a directory exists at the given path.
    async fn dir_exists(&self, path: &str) -> AppResult<bool>;

    /// Create a directory (and any missing parents).
    async fn create_dir(&self, path: &str) -> AppResult<()>;

    /// Copy a stored file to a local filesystem path.
    async fn download_to(&self, path: &str, local: &Path) -> AppResult<u64> {
        let data = self.read_bytes(path).await?;
        tokio::fs::write(local, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write local copy: {}", local.display()),
                e,
            )
        })?;
        Ok(data.len() as u64)
    }

    /// Store the contents of a local filesystem path.
    async fn upload_from(&self, local: &Path, path: &str) -> AppResult<u64> {
        let data = tokio::fs::read(local).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Local file not found: {}", local.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read local file: {}", local.display()),
                    e,
                )
            }
        })?;
        let size = data.len() as u64;
        self.write(path, Bytes::from(data)).await?;
        Ok(size)
    }
}
