//! Folder domain entities.

pub mod criteria;
pub mod model;
pub mod tree;

pub use criteria::{FolderCriteria, FolderOrder, ParentFilter, PathFilter};
pub use model::Folder;
pub use tree::{FolderNode, FolderTree};
