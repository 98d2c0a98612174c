//! Hook registry: handlers registered per event kind, ordered by priority.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use assethub_core::events::{AssetEvent, AssetEventKind};

/// What a handler asks the dispatcher to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Carry on with the next handler and the operation.
    Continue,
    /// Stop. Only honoured for `before_*` events.
    Halt {
        /// Reason reported to the caller.
        reason: String,
    },
}

impl HookAction {
    /// Shorthand for a halt with a reason.
    pub fn halt(reason: impl Into<String>) -> Self {
        Self::Halt {
            reason: reason.into(),
        }
    }
}

/// An observer of asset lifecycle events.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// React to an event.
    async fn handle(&self, event: &AssetEvent) -> HookAction;

    /// Name used in logs.
    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> i32 {
        0
    }
}

#[derive(Debug)]
struct HookEntry {
    handler: Arc<dyn HookHandler>,
    priority: i32,
}

/// Handlers organised by event kind.
#[derive(Debug, Default)]
pub struct HookRegistry {
    handlers: RwLock<HashMap<AssetEventKind, Vec<HookEntry>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub async fn register(&self, kind: AssetEventKind, handler: Arc<dyn HookHandler>) {
        let priority = handler.priority();
        let name = handler.name().to_string();

        let mut handlers = self.handlers.write().await;
        let entries = handlers.entry(kind).or_default();
        entries.push(HookEntry { handler, priority });
        entries.sort_by_key(|e| e.priority);

        info!(event = %kind, handler = %name, priority, "Hook handler registered");
    }

    /// Remove every handler with the given name.
    pub async fn unregister(&self, name: &str) {
        let mut handlers = self.handlers.write().await;
        for entries in handlers.values_mut() {
            entries.retain(|e| e.handler.name() != name);
        }
        handlers.retain(|_, entries| !entries.is_empty());
    }

    /// Handlers for an event kind in priority order.
    pub async fn get_handlers(&self, kind: AssetEventKind) -> Vec<Arc<dyn HookHandler>> {
        let handlers = self.handlers.read().await;
        handlers
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.handler.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn handler_count(&self, kind: AssetEventKind) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).map_or(0, Vec::len)
    }
}
