//! # assethub-service
//!
//! Service layer for AssetHub. [`AssetService`] is the public surface for
//! folder and file operations; it resolves folders through the index,
//! routes work to the owning backend, settles filename conflicts with the
//! [`ConflictResolver`], moves files with the [`TransferOrchestrator`], and
//! fires lifecycle hooks.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time.

pub mod assets;
pub mod collaborators;
pub mod conflict;
pub mod context;
pub mod hooks;
pub mod lifecycle;
pub mod transfer;

#[cfg(test)]
mod test_support;

pub use assets::{AssetService, Collaborators, PermissionScope, SaveOutcome, UploadRequest};
pub use collaborators::{
    MemoryTaskQueue, NoTransforms, PermissionChecker, StaticPermissions, TaskQueue, TransformIndex,
    TransformProvider,
};
pub use conflict::{ConflictResolver, MergeContext};
pub use context::RequestContext;
pub use hooks::{DispatchResult, HookAction, HookDispatcher, HookHandler, HookRegistry};
pub use lifecycle::{FileLifecycle, Removal};
pub use transfer::{MoveRequest, TransferOrchestrator};
