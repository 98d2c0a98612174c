//! Scratch files for uploads and cross-backend transfers.

use std::path::PathBuf;

use bytes::Bytes;
use tempfile::TempPath;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_entity::naming;

/// A scratch file deleted when dropped.
pub type ScratchCopy = TempPath;

/// Directory that holds scratch files.
#[derive(Debug, Clone)]
pub struct ScratchArea {
    dir: PathBuf,
}

impl ScratchArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reserve an empty scratch file keeping `filename`'s extension.
    pub async fn reserve(&self, filename: &str) -> AppResult<ScratchCopy> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create scratch directory: {}", self.dir.display()),
                e,
            )
        })?;

        let suffix = naming::extension(filename)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("scratch-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to create scratch file", e)
            })?;
        Ok(file.into_temp_path())
    }

    /// Write bytes into a fresh scratch file.
    pub async fn materialize(&self, filename: &str, data: &Bytes) -> AppResult<ScratchCopy> {
        let path = self.reserve(filename).await?;
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to write scratch file", e)
        })?;
        Ok(path)
    }
}
