//! Asset lifecycle hooks: an explicit list of observers per event kind.
//!
//! Handlers of `before_*` events may veto the operation. The veto comes
//! back as [`DispatchResult::halted`], which the caller checks before
//! mutating anything.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchResult, HookDispatcher};
pub use registry::{HookAction, HookHandler, HookRegistry};
