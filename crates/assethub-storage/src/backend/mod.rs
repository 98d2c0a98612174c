//! The storage backend contract.
//!
//! A backend owns one storage medium and keeps the folder and asset index
//! in step with it. Mutating operations report through [`OperationResult`]
//! and never fail with an `Err` except where noted.

pub mod source;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use assethub_core::config::{BackendConfig, BackendKind};
use assethub_core::result::AppResult;
use assethub_core::types::BackendId;
use assethub_core::OperationResult;
use assethub_entity::{Asset, ConflictResolution, Folder};

use crate::scratch::ScratchCopy;

pub use source::SourceBackend;

/// An inbound file payload.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client, before cleaning.
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// One storage medium with its index.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Backend identifier referenced by folder and asset rows.
    fn id(&self) -> BackendId;

    fn kind(&self) -> BackendKind;

    fn config(&self) -> &BackendConfig;

    /// The backend's top-level folder, created (row and directory) when missing.
    async fn root_folder(&self) -> AppResult<Folder>;

    /// Create `name` below `parent`. Data: `folderId`.
    async fn create_folder(&self, parent: &Folder, name: &str) -> OperationResult;

    /// Rename a folder, rewriting the paths of every descendant.
    async fn rename_folder(&self, folder: &Folder, new_name: &str) -> OperationResult;

    /// Move a folder under `new_parent` in the same backend. A clash with an
    /// existing folder is a conflict unless `merge_existing` is set.
    async fn move_folder(
        &self,
        folder: &Folder,
        new_parent: &Folder,
        merge_existing: bool,
    ) -> OperationResult;

    /// Delete a non-top-level folder with every file and folder below it.
    async fn delete_folder(&self, folder: &Folder) -> OperationResult;

    /// Whether the directory `parent_path + name` exists on the medium.
    async fn folder_exists(&self, parent_path: &str, name: &str) -> AppResult<bool>;

    /// Store an inbound payload in `folder`.
    ///
    /// A name clash stores the payload under a free numbered name and
    /// returns a conflict carrying `fileId`, `filename` and `newFilename`.
    async fn upload_file(&self, folder: &Folder, upload: Upload) -> OperationResult;

    /// Like [`StorageBackend::upload_file`] for a file already on local disk.
    async fn insert_file_by_path(
        &self,
        local_path: &Path,
        folder: &Folder,
        filename: &str,
    ) -> OperationResult;

    /// Remove the stored bytes of a file. The row is left alone.
    async fn delete_file(&self, asset: &Asset) -> AppResult<()>;

    /// Overwrite `target`'s bytes with `source`'s and refresh `target`'s row.
    async fn replace_file(&self, target: &Asset, source: &Asset) -> AppResult<()>;

    /// Copy a stored file to a scratch path owned by the caller.
    async fn get_local_copy(&self, asset: &Asset) -> AppResult<ScratchCopy>;

    /// Whether bytes exist for `filename` in `folder`.
    async fn file_exists(&self, folder: &Folder, filename: &str) -> AppResult<bool>;

    /// Index a file present on the medium but missing from the index.
    /// Returns `None` when the medium has no such file either.
    async fn index_existing_file(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>>;

    /// Describe a file present on the medium without writing a row.
    /// Returns `None` when the medium has no such file.
    async fn describe_existing_file(
        &self,
        folder: &Folder,
        filename: &str,
    ) -> AppResult<Option<Asset>>;

    /// Move a file within this backend.
    ///
    /// Returns `None` when the file lives in another backend, leaving the
    /// caller to fall back to a cross-backend transfer.
    async fn move_file_inside_source(
        &self,
        origin: BackendId,
        asset: &Asset,
        dest: &Folder,
        new_filename: &str,
        action: Option<ConflictResolution>,
    ) -> Option<OperationResult>;

    /// Commit a local copy of a foreign file into `dest` under
    /// `incoming.filename`, keeping the row's id.
    async fn transfer_file_into_source(
        &self,
        local_path: &Path,
        dest: &Folder,
        incoming: &Asset,
        action: Option<ConflictResolution>,
    ) -> OperationResult;

    /// Remove what is left of a file transferred away from this backend.
    async fn finalize_transfer(&self, original: &Asset) -> AppResult<()>;

    /// Public URL of a file, when the backend is configured with one.
    fn url_for_file(&self, folder: &Folder, asset: &Asset) -> Option<String> {
        let base = self.config().url_base.as_deref()?;
        Some(format!(
            "{}/{}{}",
            base.trim_end_matches('/'),
            folder.path,
            urlencoding::encode(&asset.filename)
        ))
    }
}
