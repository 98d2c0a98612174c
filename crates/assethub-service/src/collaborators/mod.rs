//! Narrow interfaces to the subsystems the asset service relies on but
//! does not own: image transforms, the background task queue, and
//! permission checks.

pub mod local;

use async_trait::async_trait;

use assethub_core::result::AppResult;
use assethub_core::types::TransformIndexId;
use assethub_entity::Asset;

use crate::context::RequestContext;

pub use local::{MemoryTaskQueue, NoTransforms, StaticPermissions};

/// Task kind that renders every pending transform.
pub const GENERATE_PENDING_TRANSFORMS: &str = "GeneratePendingTransforms";

/// Bookkeeping row of one transform of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformIndex {
    pub id: TransformIndexId,
    /// Whether the transformed file has been generated.
    pub file_exists: bool,
}

/// The image transform subsystem.
#[async_trait]
pub trait TransformProvider: Send + Sync + std::fmt::Debug {
    /// The index of `transform` for `asset`, created when missing.
    /// `None` when the transform is unknown.
    async fn get_or_create_index(
        &self,
        asset: &Asset,
        transform: &str,
    ) -> AppResult<Option<TransformIndex>>;

    /// URL of a generated transform.
    async fn url_for_index(&self, index: &TransformIndex) -> AppResult<String>;

    /// Generate the transformed file now.
    async fn generate(&self, index: &TransformIndex) -> AppResult<()>;

    /// Drop every generated transform and index row of a file.
    async fn delete_all_transform_data(&self, asset: &Asset) -> AppResult<()>;
}

/// The background task queue.
#[async_trait]
pub trait TaskQueue: Send + Sync + std::fmt::Debug {
    async fn has_pending(&self, kind: &str) -> AppResult<bool>;

    async fn enqueue(&self, kind: &str) -> AppResult<()>;
}

/// Permission lookups for the acting user and session.
#[async_trait]
pub trait PermissionChecker: Send + Sync + std::fmt::Debug {
    /// Whether the signed-in user holds `key`.
    async fn user_has_permission(&self, ctx: &RequestContext, key: &str) -> bool;

    /// Whether the session was granted `key` without a signed-in user.
    async fn session_authorized(&self, ctx: &RequestContext, key: &str) -> bool;
}
