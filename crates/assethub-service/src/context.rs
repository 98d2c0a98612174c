//! Request context carrying the acting user and session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assethub_core::types::UserId;

/// Context for the current request.
///
/// Passed into service methods that need to know *who* is acting, so no
/// service reads a process-wide "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The signed-in user, if any.
    pub user_id: Option<UserId>,
    /// The session the request belongs to.
    pub session_id: String,
}

impl RequestContext {
    /// Context of a signed-in user.
    pub fn user(user_id: UserId, session_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            session_id: session_id.into(),
        }
    }

    /// Context of an anonymous session.
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            session_id: session_id.into(),
        }
    }

    /// Name of this requester's personal staging folder.
    ///
    /// Anonymous sessions get a stable name derived from the session id.
    pub fn user_folder_name(&self) -> String {
        match self.user_id {
            Some(id) => format!("user_{id}"),
            None => format!(
                "user_{}",
                Uuid::new_v5(&Uuid::NAMESPACE_OID, self.session_id.as_bytes())
            ),
        }
    }
}
