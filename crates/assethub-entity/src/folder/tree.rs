//! Folder trees built from flat, path-ordered folder lists.
//!
//! The tree is an arena: folders live in one vector and child lists hold
//! indices into it, so no folder ever references another directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use assethub_core::types::FolderId;

use super::model::Folder;

/// Arena-backed folder forest.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    folders: Vec<Folder>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    slots: HashMap<FolderId, usize>,
}

impl FolderTree {
    /// Build a forest in a single pass.
    ///
    /// The input must be ordered so parents precede their descendants
    /// (ascending path order guarantees this). A folder whose parent was
    /// already seen becomes that parent's child, anything else a root.
    pub fn build(folders: impl IntoIterator<Item = Folder>) -> Self {
        let mut tree = Self::default();

        for folder in folders {
            let slot = tree.folders.len();
            let parent_slot = folder
                .parent_id
                .and_then(|parent_id| tree.slots.get(&parent_id).copied());

            match parent_slot {
                Some(parent) => tree.children[parent].push(slot),
                None => tree.roots.push(slot),
            }

            if let Some(id) = folder.id {
                tree.slots.insert(id, slot);
            }
            tree.folders.push(folder);
            tree.children.push(Vec::new());
        }

        tree
    }

    /// Stable-sort the roots by a key derived from each root folder.
    pub fn sort_roots_by_key<K: Ord>(&mut self, mut key: impl FnMut(&Folder) -> K) {
        let folders = &self.folders;
        self.roots.sort_by_key(|&slot| key(&folders[slot]));
    }

    /// Root folders in order.
    pub fn roots(&self) -> impl Iterator<Item = &Folder> {
        self.roots.iter().map(|&slot| &self.folders[slot])
    }

    /// Direct children of a folder, in input order.
    pub fn children(&self, id: FolderId) -> impl Iterator<Item = &Folder> {
        self.slots
            .get(&id)
            .map(|&slot| self.children[slot].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&child| &self.folders[child])
    }

    /// Look up a folder of this tree by id.
    pub fn get(&self, id: FolderId) -> Option<&Folder> {
        self.slots.get(&id).map(|&slot| &self.folders[slot])
    }

    /// Total number of folders in the tree.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Whether the tree holds no folders.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Owned nested representation, e.g. for serialization.
    pub fn to_nodes(&self) -> Vec<FolderNode> {
        self.roots.iter().map(|&slot| self.node(slot)).collect()
    }

    fn node(&self, slot: usize) -> FolderNode {
        FolderNode {
            folder: self.folders[slot].clone(),
            children: self.children[slot]
                .iter()
                .map(|&child| self.node(child))
                .collect(),
        }
    }
}

/// A folder with its nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// The folder.
    #[serde(flatten)]
    pub folder: Folder,
    /// Child folder nodes.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Number of folders in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(FolderNode::subtree_len).sum::<usize>()
    }
}
