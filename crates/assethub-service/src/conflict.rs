//! Resolution of filename conflicts left behind by uploads and inserts.
//!
//! When a stored file collides with an existing name, the backend keeps it
//! under a numbered name and reports a conflict. A later call settles it:
//!
//! - `Replace` copies the new bytes onto the existing file, then discards
//!   the conflicting copy.
//! - `Cancel` discards the conflicting copy.
//! - `KeepBoth` leaves both files in place.
//!
//! Discards are regular file deletes: they fire the delete hooks and drop
//! the copy's transforms.

use std::sync::Arc;

use tracing::{info, warn};

use assethub_core::error::AppError;
use assethub_core::events::AssetEvent;
use assethub_core::result::AppResult;
use assethub_core::types::operation::{FILE_ID, FILENAME};
use assethub_core::types::AssetId;
use assethub_core::OperationResult;
use assethub_entity::{Asset, ConflictResolution};
use assethub_index::{AssetIndex, FolderIndex, Uniqueness};
use assethub_storage::{BackendRegistry, StorageBackend};

use crate::assets::SaveOutcome;
use crate::lifecycle::{FileLifecycle, Removal};

/// One pending merge. Lives for a single resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeContext {
    /// The user's decision.
    pub resolution: ConflictResolution,
    /// The file stored under a numbered name when the conflict was detected.
    pub conflicting_file_id: AssetId,
    /// The name the conflicting file was meant to have.
    pub target_filename: String,
}

impl MergeContext {
    pub fn new(
        resolution: ConflictResolution,
        conflicting_file_id: AssetId,
        target_filename: impl Into<String>,
    ) -> Self {
        Self {
            resolution,
            conflicting_file_id,
            target_filename: target_filename.into(),
        }
    }

    /// Build a context from the data items of a conflict result.
    pub fn from_conflict(result: &OperationResult, resolution: ConflictResolution) -> Option<Self> {
        if !result.is_conflict() {
            return None;
        }
        Some(Self::new(resolution, result.file_id()?, result.filename()?))
    }
}

/// Outcome of the replace pre-step.
enum ReplaceStep {
    Replaced(Asset),
    Vetoed(String),
}

/// Settles conflicts recorded by [`StorageBackend`] uploads.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    registry: Arc<BackendRegistry>,
    folders: FolderIndex,
    assets: AssetIndex,
    lifecycle: FileLifecycle,
}

impl ConflictResolver {
    pub fn new(
        registry: Arc<BackendRegistry>,
        folders: FolderIndex,
        assets: AssetIndex,
        lifecycle: FileLifecycle,
    ) -> Self {
        Self {
            registry,
            folders,
            assets,
            lifecycle,
        }
    }

    /// Apply the decision recorded in `merge`. Failures end up in the result.
    pub async fn resolve(&self, merge: &MergeContext) -> OperationResult {
        match self.resolve_inner(merge).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    file_id = %merge.conflicting_file_id,
                    resolution = %merge.resolution,
                    error = %e,
                    "Conflict resolution failed"
                );
                OperationResult::from(e)
            }
        }
    }

    async fn resolve_inner(&self, merge: &MergeContext) -> AppResult<OperationResult> {
        let conflicting = self
            .assets
            .get_by_id(merge.conflicting_file_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the conflicting file!"))?;
        let backend = self.registry.get_backend(conflicting.backend_id)?;

        let kept = match merge.resolution {
            ConflictResolution::KeepBoth => {
                return Ok(OperationResult::success()
                    .with_data(FILE_ID, merge.conflicting_file_id)
                    .with_data(FILENAME, &conflicting.filename));
            }
            ConflictResolution::Replace => {
                match self
                    .replace_target(backend.as_ref(), &conflicting, &merge.target_filename)
                    .await?
                {
                    ReplaceStep::Replaced(target) => Some(target),
                    ReplaceStep::Vetoed(reason) => return Ok(OperationResult::error(reason)),
                }
            }
            ConflictResolution::Cancel => None,
        };

        if let Removal::Vetoed(reason) = self.lifecycle.remove(&conflicting, true).await? {
            return Ok(OperationResult::error(reason));
        }

        info!(
            file_id = %merge.conflicting_file_id,
            resolution = %merge.resolution,
            "Conflict resolved"
        );

        Ok(match kept {
            Some(target) => OperationResult::success()
                .with_data(FILE_ID, target.id)
                .with_data(FILENAME, &target.filename),
            None => OperationResult::success(),
        })
    }

    /// Copy the conflicting file's bytes onto the file holding the target name.
    async fn replace_target(
        &self,
        backend: &dyn StorageBackend,
        conflicting: &Asset,
        target_filename: &str,
    ) -> AppResult<ReplaceStep> {
        let folder = self
            .folders
            .get_by_id(conflicting.folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the folder!"))?;

        let target = match self
            .assets
            .find_in_folder(conflicting.folder_id, target_filename)
            .await?
        {
            Some(target) => target,
            None => {
                let mut target = backend
                    .describe_existing_file(&folder, target_filename)
                    .await?
                    .ok_or_else(|| AppError::not_found("Can’t find the file to replace!"))?;
                let store = self.assets.backing_store();
                match self.lifecycle.save_in(store.as_ref(), &mut target).await? {
                    SaveOutcome::Saved(_) => target,
                    SaveOutcome::Vetoed { reason } => return Ok(ReplaceStep::Vetoed(reason)),
                    SaveOutcome::Invalid(errors) => {
                        let message = errors.into_iter().next().map(|e| e.message);
                        return Err(AppError::validation(
                            message.unwrap_or_else(|| "Invalid file.".to_string()),
                        ));
                    }
                }
            }
        };

        // The conflicting copy is still indexed at this point.
        let errors = self.assets.validate(&target, Uniqueness::Relaxed).await?;
        if let Some(first) = errors.first() {
            return Err(AppError::validation(first.message.clone()));
        }

        let before = self
            .lifecycle
            .hooks()
            .dispatch(&AssetEvent::BeforeReplace {
                target: target.as_ref_event(),
                source: conflicting.as_ref_event(),
            })
            .await;
        if before.halted {
            return Ok(ReplaceStep::Vetoed(before.reason()));
        }

        backend.replace_file(&target, conflicting).await?;

        self.lifecycle
            .hooks()
            .notify(&AssetEvent::AfterReplace {
                target: target.as_ref_event(),
                source: conflicting.as_ref_event(),
            })
            .await;

        Ok(ReplaceStep::Replaced(target))
    }
}
