//! Asset lifecycle events.

use serde::{Deserialize, Serialize};

use crate::types::id::{AssetId, BackendId, FolderId};

/// Snapshot of the asset an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// The asset ID (absent for a not-yet-saved asset).
    pub asset_id: Option<AssetId>,
    /// The backend the asset lives on.
    pub backend_id: BackendId,
    /// The folder containing the asset.
    pub folder_id: FolderId,
    /// The filename.
    pub filename: String,
}

/// Events fired around asset persistence and replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetEvent {
    /// An asset row is about to be saved. Can be vetoed.
    BeforeSave {
        /// The asset being saved.
        asset: AssetRef,
        /// Whether the asset has no row yet.
        is_new: bool,
    },
    /// An asset row was saved.
    AfterSave {
        /// The saved asset.
        asset: AssetRef,
        /// Whether the row was inserted.
        is_new: bool,
    },
    /// An asset is about to be deleted. Can be vetoed.
    BeforeDelete {
        /// The asset being deleted.
        asset: AssetRef,
    },
    /// An asset was deleted.
    AfterDelete {
        /// The deleted asset.
        asset: AssetRef,
    },
    /// An asset's bytes are about to be replaced by another asset's. Can be vetoed.
    BeforeReplace {
        /// The asset keeping its identity.
        target: AssetRef,
        /// The asset supplying the bytes.
        source: AssetRef,
    },
    /// An asset's bytes were replaced.
    AfterReplace {
        /// The asset that kept its identity.
        target: AssetRef,
        /// The asset that supplied the bytes.
        source: AssetRef,
    },
}

/// Discriminant of [`AssetEvent`], used to register handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetEventKind {
    /// See [`AssetEvent::BeforeSave`].
    BeforeSave,
    /// See [`AssetEvent::AfterSave`].
    AfterSave,
    /// See [`AssetEvent::BeforeDelete`].
    BeforeDelete,
    /// See [`AssetEvent::AfterDelete`].
    AfterDelete,
    /// See [`AssetEvent::BeforeReplace`].
    BeforeReplace,
    /// See [`AssetEvent::AfterReplace`].
    AfterReplace,
}

impl AssetEventKind {
    /// Returns the string name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeSave => "before_save",
            Self::AfterSave => "after_save",
            Self::BeforeDelete => "before_delete",
            Self::AfterDelete => "after_delete",
            Self::BeforeReplace => "before_replace",
            Self::AfterReplace => "after_replace",
        }
    }

    /// Whether handlers of this kind may veto the operation.
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            Self::BeforeSave | Self::BeforeDelete | Self::BeforeReplace
        )
    }
}

impl std::fmt::Display for AssetEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AssetEvent {
    /// The kind of this event.
    pub fn kind(&self) -> AssetEventKind {
        match self {
            Self::BeforeSave { .. } => AssetEventKind::BeforeSave,
            Self::AfterSave { .. } => AssetEventKind::AfterSave,
            Self::BeforeDelete { .. } => AssetEventKind::BeforeDelete,
            Self::AfterDelete { .. } => AssetEventKind::AfterDelete,
            Self::BeforeReplace { .. } => AssetEventKind::BeforeReplace,
            Self::AfterReplace { .. } => AssetEventKind::AfterReplace,
        }
    }

    /// The primary asset of this event (the target for replace events).
    pub fn asset(&self) -> &AssetRef {
        match self {
            Self::BeforeSave { asset, .. }
            | Self::AfterSave { asset, .. }
            | Self::BeforeDelete { asset }
            | Self::AfterDelete { asset } => asset,
            Self::BeforeReplace { target, .. } | Self::AfterReplace { target, .. } => target,
        }
    }
}
