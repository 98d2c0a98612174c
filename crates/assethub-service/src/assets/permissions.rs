//! Permission checks scoped to backends, folders, and files.
//!
//! A permission is granted for a whole backend (`"{permission}:{backend_id}"`)
//! or for one folder or file (`"{permission}:folder:{id}"`,
//! `"{permission}:file:{id}"`). Either the signed-in user or the session
//! may hold it.

use std::fmt;

use tracing::debug;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_core::types::{AssetId, BackendId, FolderId};

use super::AssetService;
use crate::context::RequestContext;

/// What a permission key is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionScope {
    Backend(BackendId),
    Folder(FolderId),
    File(AssetId),
}

impl PermissionScope {
    /// The key naming `permission` within this scope.
    pub fn key(&self, permission: &str) -> String {
        format!("{permission}:{self}")
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(id) => write!(f, "{id}"),
            Self::Folder(id) => write!(f, "folder:{id}"),
            Self::File(id) => write!(f, "file:{id}"),
        }
    }
}

impl AssetService {
    /// Whether the requester holds `permission` in any of `scopes`.
    async fn holds(
        &self,
        ctx: &RequestContext,
        permission: &str,
        scopes: &[PermissionScope],
    ) -> bool {
        let checker = &self.collaborators.permissions;
        for scope in scopes {
            let key = scope.key(permission);
            if checker.user_has_permission(ctx, &key).await
                || checker.session_authorized(ctx, &key).await
            {
                return true;
            }
        }
        debug!(permission = %permission, session = %ctx.session_id, "Permission not held");
        false
    }

    fn denied(permission: &str) -> AppError {
        AppError::authorization(format!("You are not permitted to {permission} here."))
    }

    /// Require `permission` on the backend or on each of the folders.
    pub async fn check_permission_by_folder_ids(
        &self,
        ctx: &RequestContext,
        folder_ids: &[FolderId],
        permission: &str,
    ) -> AppResult<()> {
        for folder_id in folder_ids {
            let (folder, _) = self.folder_and_backend(*folder_id).await?;
            let scopes = [
                PermissionScope::Backend(folder.backend_id),
                PermissionScope::Folder(*folder_id),
            ];
            if !self.holds(ctx, permission, &scopes).await {
                return Err(Self::denied(permission));
            }
        }
        Ok(())
    }

    /// Require `permission` on the backend, the folder, or each of the files.
    pub async fn check_permission_by_file_ids(
        &self,
        ctx: &RequestContext,
        file_ids: &[AssetId],
        permission: &str,
    ) -> AppResult<()> {
        for file_id in file_ids {
            let asset = self.require_file(*file_id).await?;
            let scopes = [
                PermissionScope::Backend(asset.backend_id),
                PermissionScope::Folder(asset.folder_id),
                PermissionScope::File(*file_id),
            ];
            if !self.holds(ctx, permission, &scopes).await {
                return Err(Self::denied(permission));
            }
        }
        Ok(())
    }

    /// Non-failing form of [`AssetService::check_permission_by_folder_ids`]
    /// for a single folder. Lookup failures still propagate.
    pub async fn can_user_perform_action(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        action: &str,
    ) -> AppResult<bool> {
        match self
            .check_permission_by_folder_ids(ctx, &[folder_id], action)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.kind == ErrorKind::Authorization => Ok(false),
            Err(e) => Err(e),
        }
    }
}
