//! Hook dispatcher: runs the handlers of an event and reports a veto.
//!
//! For `before_*` events the first `Halt` stops the remaining handlers.
//! For `after_*` events every handler runs and a `Halt` is ignored.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use assethub_core::events::AssetEvent;

use super::registry::{HookAction, HookRegistry};

/// Upper bound for a single handler call.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// Whether a handler vetoed the operation.
    pub halted: bool,
    /// Reason given by the vetoing handler.
    pub halt_reason: Option<String>,
    /// Name of the vetoing handler.
    pub halted_by: Option<String>,
}

impl DispatchResult {
    /// The veto reason, or a generic one.
    pub fn reason(&self) -> String {
        self.halt_reason
            .clone()
            .unwrap_or_else(|| "The operation was cancelled by an event handler.".to_string())
    }
}

/// Fires events at the registered handlers.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch an event to every handler of its kind.
    pub async fn dispatch(&self, event: &AssetEvent) -> DispatchResult {
        let kind = event.kind();
        let handlers = self.registry.get_handlers(kind).await;
        let mut result = DispatchResult::default();
        if handlers.is_empty() {
            return result;
        }

        debug!(event = %kind, handler_count = handlers.len(), "Dispatching event");

        for handler in &handlers {
            let action = match tokio::time::timeout(HANDLER_TIMEOUT, handler.handle(event)).await {
                Ok(action) => action,
                Err(_) => {
                    error!(event = %kind, handler = %handler.name(), "Hook handler timed out");
                    HookAction::Continue
                }
            };

            let HookAction::Halt { reason } = action else {
                continue;
            };

            if kind.is_before() {
                info!(event = %kind, handler = %handler.name(), reason = %reason, "Handler vetoed operation");
                result.halted = true;
                result.halt_reason = Some(reason);
                result.halted_by = Some(handler.name().to_string());
                break;
            }
            warn!(event = %kind, handler = %handler.name(), "Halt returned for an after event, ignoring");
        }

        result
    }

    /// Dispatch an event whose handlers cannot veto.
    pub async fn notify(&self, event: &AssetEvent) {
        let _ = self.dispatch(event).await;
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}
