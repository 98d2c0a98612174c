//! Asset query criteria.

use serde::{Deserialize, Serialize};

use assethub_core::types::param::escape_list_item;
use assethub_core::types::{AssetId, BackendId, FolderId};

use super::kind::AssetKind;

/// Criteria for finding assets.
///
/// `filename` is a list parameter; [`AssetCriteria::filename`] escapes a
/// literal name so a comma in it is not read as a separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCriteria {
    /// Match any of these ids.
    pub ids: Vec<AssetId>,
    /// Match any of these backends.
    pub backend_ids: Vec<BackendId>,
    /// Match any of these folders.
    pub folder_ids: Vec<FolderId>,
    /// Filename list parameter.
    pub filename: Option<String>,
    /// Match any of these kinds.
    pub kinds: Vec<AssetKind>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// Maximum rows to return.
    pub limit: Option<u64>,
}

impl AssetCriteria {
    /// Criteria matching a single id.
    pub fn by_id(id: AssetId) -> Self {
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

    /// Restrict to one folder.
    pub fn folder(mut self, folder_id: FolderId) -> Self {
        self.folder_ids = vec![folder_id];
        self
    }

    /// Restrict to a set of folders.
    pub fn folders(mut self, folder_ids: impl IntoIterator<Item = FolderId>) -> Self {
        self.folder_ids = folder_ids.into_iter().collect();
        self
    }

    /// Match a literal filename.
    pub fn filename(mut self, filename: &str) -> Self {
        self.filename = Some(escape_list_item(filename));
        self
    }

    /// Restrict to a kind.
    pub fn kind(mut self, kind: AssetKind) -> Self {
        self.kinds = vec![kind];
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
