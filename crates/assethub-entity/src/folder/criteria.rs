//! Folder query criteria.

use serde::{Deserialize, Serialize};

use assethub_core::types::param::escape_list_item;
use assethub_core::types::{BackendId, FolderId};

/// Parent constraint of a folder query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentFilter {
    /// Only top-level folders (no parent).
    TopLevel,
    /// Only direct children of the given folder.
    Is(FolderId),
}

/// Path constraint of a folder query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathFilter {
    /// Path equals one of the values of a list parameter.
    Exact(String),
    /// Path starts with the given literal prefix.
    Prefix(String),
}

/// Result ordering of a folder query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderOrder {
    /// Ascending by path; parents come before their descendants.
    #[default]
    Path,
    /// Ascending by name.
    Name,
}

/// Criteria for finding folders.
///
/// `name` and exact `path` are list parameters (see
/// [`parse_list_param`](assethub_core::types::param::parse_list_param));
/// the builder methods escape literal values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCriteria {
    /// Match any of these ids.
    pub ids: Vec<FolderId>,
    /// Match any of these backends.
    pub backend_ids: Vec<BackendId>,
    /// Parent constraint.
    pub parent: Option<ParentFilter>,
    /// Name list parameter.
    pub name: Option<String>,
    /// Path constraint.
    pub path: Option<PathFilter>,
    /// Ordering.
    pub order: FolderOrder,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Maximum rows to return.
    pub limit: Option<u64>,
}

impl FolderCriteria {
    /// Criteria matching nothing but the given id.
    pub fn by_id(id: FolderId) -> Self {
        Self {
            ids: vec![id],
            ..Self::default()
        }
    }

    /// Restrict to one backend.
    pub fn backend(mut self, backend_id: BackendId) -> Self {
        self.backend_ids = vec![backend_id];
        self
    }

    /// Restrict to a set of backends.
    pub fn backends(mut self, backend_ids: impl IntoIterator<Item = BackendId>) -> Self {
        self.backend_ids = backend_ids.into_iter().collect();
        self
    }

    /// Restrict to direct children of a folder.
    pub fn parent(mut self, parent_id: FolderId) -> Self {
        self.parent = Some(ParentFilter::Is(parent_id));
        self
    }

    /// Restrict to top-level folders.
    pub fn top_level(mut self) -> Self {
        self.parent = Some(ParentFilter::TopLevel);
        self
    }

    /// Match a literal name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(escape_list_item(name));
        self
    }

    /// Match a literal path exactly.
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(PathFilter::Exact(escape_list_item(path)));
        self
    }

    /// Match every path starting with `prefix`.
    pub fn path_prefix(mut self, prefix: &str) -> Self {
        self.path = Some(PathFilter::Prefix(prefix.to_string()));
        self
    }

    /// Set the ordering.
    pub fn order_by(mut self, order: FolderOrder) -> Self {
        self.order = order;
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` results.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assethub_core::types::param::parse_list_param;

    #[test]
    fn test_path_with_comma_stays_one_value() {
        let criteria = FolderCriteria::default().path("reports, 2024/");
        let Some(PathFilter::Exact(raw)) = criteria.path else {
            panic!("expected an exact path filter");
        };
        assert_eq!(parse_list_param(&raw), vec!["reports, 2024/"]);
    }

    #[test]
    fn test_prefix_is_not_escaped() {
        let criteria = FolderCriteria::default().path_prefix("a,b/");
        assert_eq!(criteria.path, Some(PathFilter::Prefix("a,b/".into())));
    }
}
