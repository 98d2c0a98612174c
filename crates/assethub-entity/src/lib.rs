//! # assethub-entity
//!
//! Domain entity models for AssetHub. `Folder` and `Asset` represent rows of
//! the folder and asset tables and derive `sqlx::FromRow`; the criteria
//! types describe index queries; `naming` holds the deterministic filename
//! rules every create and insert path applies before touching storage.

pub mod asset;
pub mod conflict;
pub mod folder;
pub mod naming;

pub use asset::{Asset, AssetCriteria, AssetKind};
pub use conflict::ConflictResolution;
pub use folder::{Folder, FolderCriteria, FolderTree};
