//! In-process collaborators for tooling and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_entity::Asset;

use super::{PermissionChecker, TaskQueue, TransformIndex, TransformProvider};
use crate::context::RequestContext;

/// A transform subsystem that knows no transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransforms;

#[async_trait]
impl TransformProvider for NoTransforms {
    async fn get_or_create_index(
        &self,
        _asset: &Asset,
        _transform: &str,
    ) -> AppResult<Option<TransformIndex>> {
        Ok(None)
    }

    async fn url_for_index(&self, index: &TransformIndex) -> AppResult<String> {
        Err(AppError::not_found(format!(
            "Transform {} not found",
            index.id
        )))
    }

    async fn generate(&self, _index: &TransformIndex) -> AppResult<()> {
        Ok(())
    }

    async fn delete_all_transform_data(&self, _asset: &Asset) -> AppResult<()> {
        Ok(())
    }
}

/// A task queue that only remembers what was enqueued.
#[derive(Debug, Default)]
pub struct MemoryTaskQueue {
    pending: Mutex<Vec<String>>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueued task kinds, oldest first.
    pub async fn pending(&self) -> Vec<String> {
        self.pending.lock().await.clone()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn has_pending(&self, kind: &str) -> AppResult<bool> {
        Ok(self.pending.lock().await.iter().any(|k| k == kind))
    }

    async fn enqueue(&self, kind: &str) -> AppResult<()> {
        debug!(kind = %kind, "Task enqueued");
        self.pending.lock().await.push(kind.to_string());
        Ok(())
    }
}

/// A fixed set of granted permission keys, shared by every user and session.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: HashSet<String>,
    allow_all: bool,
}

impl StaticPermissions {
    /// Grant every key.
    pub fn allow_all() -> Self {
        Self {
            granted: HashSet::new(),
            allow_all: true,
        }
    }

    /// Grant exactly these keys.
    pub fn granting<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: keys.into_iter().map(Into::into).collect(),
            allow_all: false,
        }
    }

    fn holds(&self, key: &str) -> bool {
        self.allow_all || self.granted.contains(key)
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn user_has_permission(&self, ctx: &RequestContext, key: &str) -> bool {
        ctx.user_id.is_some() && self.holds(key)
    }

    async fn session_authorized(&self, _ctx: &RequestContext, key: &str) -> bool {
        self.holds(key)
    }
}
