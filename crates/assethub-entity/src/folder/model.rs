//! Folder entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use assethub_core::types::{BackendId, FolderId};

/// A folder in a backend's hierarchy.
///
/// `path` is denormalized: the top-level folder of a backend has the empty
/// path and every other folder's path is its parent's path followed by its
/// own name and a trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Folder identifier, absent until the folder is stored.
    pub id: Option<FolderId>,
    /// Parent folder (None for the backend's top-level folder).
    pub parent_id: Option<FolderId>,
    /// The backend owning this folder.
    pub backend_id: BackendId,
    /// Leaf name.
    pub name: String,
    /// Full path from the backend root.
    pub path: String,
}

impl Folder {
    /// A not-yet-stored top-level folder for a backend.
    pub fn top_level(backend_id: BackendId, name: impl Into<String>) -> Self {
        Self {
            id: None,
            parent_id: None,
            backend_id,
            name: name.into(),
            path: String::new(),
        }
    }

    /// A not-yet-stored child of this folder.
    pub fn new_child(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: None,
            parent_id: self.id,
            backend_id: self.backend_id,
            path: self.child_path(&name),
            name,
        }
    }

    /// Whether this is a backend's top-level folder.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The path a child named `name` would have.
    pub fn child_path(&self, name: &str) -> String {
        format!("{}{}/", self.path, name)
    }

    /// Whether `other` is this folder or lies below it in the same backend.
    pub fn contains(&self, other: &Folder) -> bool {
        self.backend_id == other.backend_id && other.path.starts_with(&self.path)
    }

    /// Return the stored id or a not-found error.
    pub fn require_id(&self) -> assethub_core::AppResult<FolderId> {
        self.id.ok_or_else(|| {
            assethub_core::AppError::not_found(format!("Folder '{}' is not indexed", self.name))
        })
    }
}
