//! Folder operations of [`SourceBackend`].

use std::collections::HashMap;

use tracing::{debug, info};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::operation::FOLDER_ID;
use assethub_core::types::FolderId;
use assethub_core::OperationResult;
use assethub_entity::naming;
use assethub_entity::{AssetCriteria, Folder, FolderCriteria};

use super::SourceBackend;
use crate::backend::StorageBackend;

/// Data item carrying a folder's cleaned new name.
pub const NEW_NAME: &str = "newName";

fn folder_exists_error(name: &str) -> AppError {
    AppError::conflict(format!(
        "A folder with the name “{name}” already exists in the folder."
    ))
}

impl SourceBackend {
    pub(super) async fn ensure_root_folder(&self) -> AppResult<Folder> {
        let criteria = FolderCriteria::default().backend(self.id()).top_level();
        if let Some(root) = self.folders.find_one(&criteria).await? {
            return Ok(root);
        }

        self.provider.create_dir("").await?;
        let mut root = Folder::top_level(self.id(), self.config.name.clone());
        root.id = Some(self.folders.store(&root).await?);
        info!(backend = %self.id(), name = %root.name, "Created top-level folder");
        Ok(root)
    }

    async fn parent_of(&self, folder: &Folder) -> AppResult<Folder> {
        let parent_id = folder.parent_id.ok_or_else(|| {
            AppError::validation(format!("Folder '{}' has no parent", folder.name))
        })?;
        self.folders
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {parent_id} not found")))
    }

    /// Whether `parent` already holds a folder named `name`, in the index
    /// or on the medium.
    async fn sibling_exists(&self, parent: &Folder, name: &str) -> AppResult<bool> {
        let parent_id = parent.require_id()?;
        let indexed = self
            .folders
            .find_one(&FolderCriteria::default().parent(parent_id).name(name))
            .await?;
        Ok(indexed.is_some() || self.folder_exists(&parent.path, name).await?)
    }

    pub(super) async fn create_folder_inner(
        &self,
        parent: &Folder,
        name: &str,
    ) -> AppResult<OperationResult> {
        self.ensure_own(parent)?;
        parent.require_id()?;
        let name = naming::clean_asset_name(name, false, &self.rules.naming);

        if self.sibling_exists(parent, &name).await? {
            return Err(folder_exists_error(&name));
        }

        let mut folder = parent.new_child(name);
        self.provider.create_dir(&folder.path).await?;
        let id = self.folders.store(&folder).await?;
        folder.id = Some(id);

        info!(backend = %self.id(), folder_id = %id, path = %folder.path, "Created folder");
        Ok(OperationResult::success().with_data(FOLDER_ID, id))
    }

    pub(super) async fn rename_folder_inner(
        &self,
        folder: &Folder,
        new_name: &str,
    ) -> AppResult<OperationResult> {
        self.ensure_own(folder)?;
        let id = folder.require_id()?;
        if folder.is_top_level() {
            return Err(AppError::validation("Top-level folders cannot be renamed."));
        }

        let new_name = naming::clean_asset_name(new_name, false, &self.rules.naming);
        if new_name == folder.name {
            return Ok(OperationResult::success().with_data(NEW_NAME, &new_name));
        }

        let parent = self.parent_of(folder).await?;
        let case_change = new_name.to_lowercase() == folder.name.to_lowercase();
        if !case_change && self.sibling_exists(&parent, &new_name).await? {
            return Err(folder_exists_error(&new_name));
        }

        let renamed = Folder {
            name: new_name.clone(),
            path: parent.child_path(&new_name),
            ..folder.clone()
        };
        self.provider.rename_dir(&folder.path, &renamed.path).await?;
        self.relocate_tree(folder, renamed).await?;

        info!(backend = %self.id(), folder_id = %id, new_name = %new_name, "Renamed folder");
        Ok(OperationResult::success().with_data(NEW_NAME, &new_name))
    }

    pub(super) async fn move_folder_inner(
        &self,
        folder: &Folder,
        new_parent: &Folder,
        merge_existing: bool,
    ) -> AppResult<OperationResult> {
        let id = folder.require_id()?;
        let new_parent_id = new_parent.require_id()?;
        if folder.is_top_level() {
            return Err(AppError::validation("Top-level folders cannot be moved."));
        }
        if folder.backend_id != self.id() || new_parent.backend_id != self.id() {
            return Err(AppError::validation(
                "Folders can only be moved within the same backend.",
            ));
        }
        if folder.contains(new_parent) {
            return Err(AppError::validation(
                "A folder cannot be moved into itself or one of its subfolders.",
            ));
        }
        if folder.parent_id == Some(new_parent_id) {
            return Ok(OperationResult::success().with_data(FOLDER_ID, id));
        }

        let dest_path = new_parent.child_path(&folder.name);
        let indexed = self
            .folders
            .find_one(&FolderCriteria::default().backend(self.id()).path(&dest_path))
            .await?;
        let on_medium = self.provider.dir_exists(&dest_path).await?;

        if (indexed.is_some() || on_medium) && !merge_existing {
            return Ok(OperationResult::conflict(format!(
                "A folder with the name “{}” already exists in the destination folder.",
                folder.name
            ))
            .with_data(FOLDER_ID, id));
        }

        if indexed.is_some() || on_medium {
            let target = match indexed {
                Some(target) => target,
                None => {
                    let mut target = new_parent.new_child(folder.name.clone());
                    target.id = Some(self.folders.store(&target).await?);
                    target
                }
            };
            self.merge_into(folder, &target).await?;
            info!(backend = %self.id(), folder_id = %id, into = ?target.id, "Merged folder");
            return Ok(OperationResult::success().with_data(FOLDER_ID, target.id));
        }

        let moved = Folder {
            parent_id: Some(new_parent_id),
            path: dest_path,
            ..folder.clone()
        };
        self.provider.rename_dir(&folder.path, &moved.path).await?;
        self.relocate_tree(folder, moved).await?;

        info!(backend = %self.id(), folder_id = %id, parent_id = %new_parent_id, "Moved folder");
        Ok(OperationResult::success().with_data(FOLDER_ID, id))
    }

    pub(super) async fn delete_folder_inner(&self, folder: &Folder) -> AppResult<OperationResult> {
        self.ensure_own(folder)?;
        let id = folder.require_id()?;
        if folder.is_top_level() {
            return Err(AppError::validation("Top-level folders cannot be deleted."));
        }

        let ids: Vec<FolderId> = self
            .folders
            .descendants_of(folder)
            .await?
            .into_keys()
            .collect();
        let files = self.assets.delete_in_folders(&ids).await?;
        self.folders.delete(&ids).await?;
        self.provider.delete_dir(&folder.path).await?;

        info!(backend = %self.id(), folder_id = %id, folders = ids.len(), files, "Deleted folder");
        Ok(OperationResult::success().with_data(FOLDER_ID, id))
    }

    /// Store `moved` in place of `original` and rewrite the path of every
    /// folder below it.
    async fn relocate_tree(&self, original: &Folder, moved: Folder) -> AppResult<()> {
        let old_prefix = original.path.as_str();
        for (id, mut descendant) in self.folders.descendants_of(original).await? {
            if Some(id) == original.id {
                continue;
            }
            descendant.path = format!("{}{}", moved.path, &descendant.path[old_prefix.len()..]);
            debug!(folder_id = %id, path = %descendant.path, "Rewrote folder path");
            self.folders.store(&descendant).await?;
        }
        self.folders.store(&moved).await?;
        Ok(())
    }

    /// Move every folder and file of `source` into `target`, replacing files
    /// of the same name, then drop `source`.
    async fn merge_into(&self, source: &Folder, target: &Folder) -> AppResult<()> {
        let mut sources: Vec<Folder> = self
            .folders
            .descendants_of(source)
            .await?
            .into_values()
            .collect();
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        let mut placed: HashMap<FolderId, Folder> = HashMap::new();
        for src in &sources {
            let src_id = src.require_id()?;
            let dest = if Some(src_id) == source.id {
                target.clone()
            } else {
                let parent = src
                    .parent_id
                    .and_then(|parent_id| placed.get(&parent_id))
                    .ok_or_else(|| {
                        AppError::internal(format!("Merge lost the parent of '{}'", src.path))
                    })?;
                self.merged_child(parent, &src.name).await?
            };
            let dest_id = dest.require_id()?;

            for asset in self.assets.find(&AssetCriteria::default().folder(src_id)).await? {
                let existing = self.assets.find_in_folder(dest_id, &asset.filename).await?;
                if let Some(existing_id) = existing.and_then(|row| row.id) {
                    self.assets.delete(existing_id).await?;
                }
                self.provider
                    .rename(
                        &Self::key(src, &asset.filename),
                        &Self::key(&dest, &asset.filename),
                    )
                    .await?;
                self.assets
                    .save(&assethub_entity::Asset {
                        folder_id: dest_id,
                        ..asset
                    })
                    .await?;
            }

            placed.insert(src_id, dest);
        }

        let ids: Vec<FolderId> = sources.iter().filter_map(|f| f.id).collect();
        self.folders.delete(&ids).await?;
        self.provider.delete_dir(&source.path).await
    }

    /// The child `name` of `parent`, created when missing.
    async fn merged_child(&self, parent: &Folder, name: &str) -> AppResult<Folder> {
        let path = parent.child_path(name);
        let criteria = FolderCriteria::default().backend(self.id()).path(&path);
        if let Some(existing) = self.folders.find_one(&criteria).await? {
            return Ok(existing);
        }

        let mut child = parent.new_child(name);
        self.provider.create_dir(&child.path).await?;
        child.id = Some(self.folders.store(&child).await?);
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::super::test_support::Fixture;
    use super::*;
    use crate::backend::Upload;

    #[tokio::test]
    async fn test_create_folder_rejects_existing_sibling() {
        let fx = Fixture::new();
        let backend = fx.local("Uploads").await;
        let root = backend.root_folder().await.unwrap();

        let created = backend.create_folder(&root, "My Photos").await;
        assert!(created.is_success());
        let folder = fx.folders.get_by_id(created.folder_id().unwrap()).await.unwrap().unwrap();
        assert_eq!(folder.path, "My-Photos/");

        let again = backend.create_folder(&root, "My  Photos").await;
        assert!(again.is_error());
    }

    #[tokio::test]
    async fn test_rename_rewrites_descendant_paths() {
        let fx = Fixture::new();
        let backend = fx.local("Uploads").await;
        let root = backend.root_folder().await.unwrap();
        let a_id = backend.create_folder(&root, "a").await.folder_id().unwrap();
        let a = fx.folders.get_by_id(a_id).await.unwrap().unwrap();
        let b_id = backend.create_folder(&a, "b").await.folder_id().unwrap();

        let result = backend.rename_folder(&a, "renamed").await;
        assert!(result.is_success());

        let b = fx.folders.get_by_id(b_id).await.unwrap().unwrap();
        assert_eq!(b.path, "renamed/b/");
        assert!(backend.folder_exists("renamed/", "b").await.unwrap());
        assert!(!backend.folder_exists("", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_top_level_folder_cannot_be_renamed_or_deleted() {
        let fx = Fixture::new();
        let backend = fx.local("Uploads").await;
        let root = backend.root_folder().await.unwrap();

        assert!(backend.rename_folder(&root, "x").await.is_error());
        assert!(backend.delete_folder(&root).await.is_error());
    }

    #[tokio::test]
    async fn test_move_into_descendant_is_rejected() {
        let fx = Fixture::new();
        let backend = fx.object("Media");
        let root = backend.root_folder().await.unwrap();
        let a_id = backend.create_folder(&root, "a").await.folder_id().unwrap();
        let a = fx.folders.get_by_id(a_id).await.unwrap().unwrap();
        let b_id = backend.create_folder(&a, "b").await.folder_id().unwrap();
        let b = fx.folders.get_by_id(b_id).await.unwrap().unwrap();

        assert!(backend.move_folder(&a, &b, false).await.is_error());
    }

    #[tokio::test]
    async fn test_move_onto_existing_name_conflicts_then_merges() {
        let fx = Fixture::new();
        let backend = fx.local("Uploads").await;
        let root = backend.root_folder().await.unwrap();

        let src_parent_id = backend.create_folder(&root, "src").await.folder_id().unwrap();
        let src_parent = fx.folders.get_by_id(src_parent_id).await.unwrap().unwrap();
        let docs_id = backend.create_folder(&src_parent, "docs").await.folder_id().unwrap();
        let docs = fx.folders.get_by_id(docs_id).await.unwrap().unwrap();
        let existing_id = backend.create_folder(&root, "docs").await.folder_id().unwrap();
        let existing = fx.folders.get_by_id(existing_id).await.unwrap().unwrap();

        backend.upload_file(&docs, Upload::new("a.txt", Bytes::from("new"))).await;
        backend.upload_file(&docs, Upload::new("b.txt", Bytes::from("b"))).await;
        backend.upload_file(&existing, Upload::new("a.txt", Bytes::from("old"))).await;

        let conflict = backend.move_folder(&docs, &root, false).await;
        assert!(conflict.is_conflict());

        let merged = backend.move_folder(&docs, &root, true).await;
        assert!(merged.is_success());
        assert_eq!(merged.folder_id(), Some(existing_id));

        let files = fx
            .assets
            .find(&AssetCriteria::default().folder(existing_id))
            .await
            .unwrap();
        let names: Vec<&str> = files.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        let bytes = backend.provider().read_bytes("docs/a.txt").await.unwrap();
        assert_eq!(bytes, Bytes::from("new"));
        assert!(fx.folders.get_by_id(docs_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_folder_removes_rows_and_directory() {
        let fx = Fixture::new();
        let backend = fx.local("Uploads").await;
        let root = backend.root_folder().await.unwrap();
        let a_id = backend.create_folder(&root, "a").await.folder_id().unwrap();
        let a = fx.folders.get_by_id(a_id).await.unwrap().unwrap();
        let b_id = backend.create_folder(&a, "b").await.folder_id().unwrap();
        let b = fx.folders.get_by_id(b_id).await.unwrap().unwrap();
        backend.upload_file(&b, Upload::new("x.txt", Bytes::from("x"))).await;

        assert!(backend.delete_folder(&a).await.is_success());
        assert!(fx.folders.get_by_id(b_id).await.unwrap().is_none());
        assert_eq!(fx.assets.count(&AssetCriteria::default()).await.unwrap(), 0);
        assert!(!backend.folder_exists("", "a").await.unwrap());
    }
}
