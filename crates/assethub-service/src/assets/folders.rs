//! Folder operations of the asset service.

use std::collections::HashMap;

use tracing::info;

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::{BackendId, FolderId};
use assethub_core::OperationResult;
use assethub_entity::{Folder, FolderCriteria, FolderTree};

use super::AssetService;
use crate::context::RequestContext;

impl AssetService {
    /// A folder by id. Unknown ids are `None`, however often they are asked for.
    pub async fn get_folder_by_id(&self, folder_id: FolderId) -> AppResult<Option<Folder>> {
        self.folders.get_by_id(folder_id).await
    }

    pub async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        self.folders.find(criteria).await
    }

    pub async fn find_folder(&self, criteria: &FolderCriteria) -> AppResult<Option<Folder>> {
        self.folders.find_one(criteria).await
    }

    pub async fn get_total_folders(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        self.folders.count(criteria).await
    }

    /// Every folder below `folder`, and `folder` itself, keyed by id.
    pub async fn get_all_descendant_folders(
        &self,
        folder: &Folder,
    ) -> AppResult<HashMap<FolderId, Folder>> {
        self.folders.descendants_of(folder).await
    }

    /// Write a folder row directly, without touching storage.
    pub async fn store_folder(&self, folder: &Folder) -> AppResult<FolderId> {
        self.folders.store(folder).await
    }

    pub async fn create_folder(&self, parent_id: FolderId, name: &str) -> OperationResult {
        match self.folder_and_backend(parent_id).await {
            Ok((parent, backend)) => backend.create_folder(&parent, name).await,
            Err(e) => e.into(),
        }
    }

    pub async fn rename_folder(&self, folder_id: FolderId, new_name: &str) -> OperationResult {
        match self.folder_and_backend(folder_id).await {
            Ok((folder, backend)) => backend.rename_folder(&folder, new_name).await,
            Err(e) => e.into(),
        }
    }

    /// Move a folder under another one of the same backend.
    pub async fn move_folder(
        &self,
        folder_id: FolderId,
        new_parent_id: FolderId,
        merge_existing: bool,
    ) -> OperationResult {
        let moved = async {
            let (folder, backend) = self.folder_and_backend(folder_id).await?;
            let new_parent = self
                .folders
                .get_by_id(new_parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Can’t find the destination folder!"))?;
            Ok::<_, AppError>(backend.move_folder(&folder, &new_parent, merge_existing).await)
        };
        moved.await.unwrap_or_else(OperationResult::from)
    }

    /// Delete a folder with its files and subfolders, on storage and in the index.
    pub async fn delete_folder(&self, folder_id: FolderId) -> OperationResult {
        match self.folder_and_backend(folder_id).await {
            Ok((folder, backend)) => backend.delete_folder(&folder).await,
            Err(e) => e.into(),
        }
    }

    /// Remove a folder row; child rows cascade. Storage is left alone.
    pub async fn delete_folder_record(&self, folder_id: FolderId) -> AppResult<()> {
        let removed = self.folders.delete(&[folder_id]).await?;
        info!(folder_id = %folder_id, removed, "Folder record deleted");
        Ok(())
    }

    /// One forest holding every folder of the given backends.
    pub async fn get_folder_tree_by_backend_ids(
        &self,
        backend_ids: &[BackendId],
    ) -> AppResult<FolderTree> {
        let registry = &self.registry;
        self.folders
            .tree_for_backends(backend_ids, |id| registry.sort_order(id))
            .await
    }

    /// The tree rooted at a folder.
    pub async fn get_folder_tree_by_folder_id(&self, folder_id: FolderId) -> AppResult<FolderTree> {
        let folder = self
            .folders
            .get_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the folder!"))?;
        let descendants = self.folders.descendants_of(&folder).await?;
        let registry = &self.registry;
        Ok(self
            .folders
            .build_tree(descendants.into_values().collect(), |id| registry.sort_order(id)))
    }

    /// The requester's personal folder in the staging backend, created on
    /// first use.
    pub async fn get_user_folder(&self, ctx: &RequestContext) -> AppResult<Folder> {
        let staging = self
            .registry
            .staging_backend()
            .ok_or_else(|| AppError::configuration("No staging backend is configured"))?;
        let root = staging.root_folder().await?;
        let root_id = root.require_id()?;
        let name = ctx.user_folder_name();

        let criteria = FolderCriteria::default().parent(root_id).name(&name);
        if let Some(folder) = self.folders.find_one(&criteria).await? {
            return Ok(folder);
        }

        let created = staging.create_folder(&root, &name).await;
        let folder_id = created.folder_id().ok_or_else(|| {
            AppError::storage(
                created
                    .error_message()
                    .unwrap_or("Could not create the user folder")
                    .to_string(),
            )
        })?;
        info!(folder_id = %folder_id, name = %name, "Created user folder");

        self.folders
            .get_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Can’t find the user folder!"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assethub_core::types::UserId;

    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_unknown_folder_is_absent_on_every_call() {
        let h = Harness::new().await;
        let id = FolderId::new();

        assert!(h.service.get_folder_by_id(id).await.unwrap().is_none());
        assert!(h.service.get_folder_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stored_folder_is_visible_to_lookups() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        let id = folder.id.unwrap();
        h.service.get_folder_by_id(id).await.unwrap();

        let updated = Folder {
            name: "b".to_string(),
            path: "b/".to_string(),
            ..folder
        };
        h.service.store_folder(&updated).await.unwrap();

        let found = h
            .service
            .find_folders(&FolderCriteria::by_id(id))
            .await
            .unwrap();
        assert_eq!(found, vec![updated.clone()]);
        assert_eq!(h.service.get_folder_by_id(id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_folder_crud_through_service() {
        let h = Harness::new().await;
        let root_id = h.root(h.local).await;

        let created = h.service.create_folder(root_id, "Reports 2024").await;
        let id = created.folder_id().unwrap();
        let renamed = h.service.rename_folder(id, "archive").await;
        assert!(renamed.is_success());
        assert_eq!(h.service.get_folder_by_id(id).await.unwrap().unwrap().path, "archive/");

        let deleted = h.service.delete_folder(id).await;
        assert!(deleted.is_success());
        assert!(h.service.get_folder_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_move_folder_to_missing_parent_is_error_result() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        let result = h
            .service
            .move_folder(folder.id.unwrap(), FolderId::new(), false)
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_trees_by_backend_follow_sort_order() {
        let h = Harness::new().await;
        h.folder(h.local, "a").await;
        h.folder(h.object, "b").await;

        let tree = h
            .service
            .get_folder_tree_by_backend_ids(&[h.object, h.local])
            .await
            .unwrap();

        let roots: Vec<_> = tree.roots().map(|f| f.backend_id).collect();
        assert_eq!(roots, vec![h.local, h.object]);
        assert_eq!(tree.len(), 4);
    }

    #[tokio::test]
    async fn test_tree_by_folder_id_is_rooted_at_folder() {
        let h = Harness::new().await;
        let a = h.folder(h.local, "a").await;
        let child = h.service.create_folder(a.id.unwrap(), "b").await;
        assert!(child.is_success());

        let tree = h.service.get_folder_tree_by_folder_id(a.id.unwrap()).await.unwrap();

        let roots: Vec<_> = tree.roots().map(|f| f.id).collect();
        assert_eq!(roots, vec![a.id]);
        assert_eq!(tree.children(a.id.unwrap()).count(), 1);
    }

    #[tokio::test]
    async fn test_user_folder_created_once() {
        let h = Harness::new().await;
        let ctx = RequestContext::user(UserId::new(), "sess");

        let first = h.service.get_user_folder(&ctx).await.unwrap();
        let second = h.service.get_user_folder(&ctx).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.backend_id, h.staging);
        assert_eq!(first.name, ctx.user_folder_name());
    }

    #[tokio::test]
    async fn test_delete_folder_record_leaves_storage() {
        let h = Harness::new().await;
        let folder = h.folder(h.local, "a").await;
        h.service.delete_folder_record(folder.id.unwrap()).await.unwrap();

        assert!(h.service.get_folder_by_id(folder.id.unwrap()).await.unwrap().is_none());
        let backend = h.service.registry().get_backend(h.local).unwrap();
        assert!(backend.folder_exists("", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_absent_folder_is_found_once_stored() {
        let h = Harness::new().await;
        let root_id = h.root(h.local).await;
        let root = h.service.get_folder_by_id(root_id).await.unwrap().unwrap();
        let id = FolderId::new();

        for _ in 0..2 {
            assert!(h.service.get_folder_by_id(id).await.unwrap().is_none());
        }

        let fresh = Folder {
            id: Some(id),
            ..root.new_child("fresh")
        };
        h.service.store_folder(&fresh).await.unwrap();

        let found = h
            .service
            .find_folders(&FolderCriteria::by_id(id))
            .await
            .unwrap();
        assert_eq!(found, vec![fresh.clone()]);
        assert_eq!(h.service.get_folder_by_id(id).await.unwrap(), Some(fresh));
    }

    #[tokio::test]
    async fn test_deleting_folder_record_forgets_cached_children() {
        let h = Harness::new().await;
        let parent = h.folder(h.local, "a").await;
        let child_id = h
            .service
            .create_folder(parent.id.unwrap(), "b")
            .await
            .folder_id()
            .unwrap();
        assert!(h.service.get_folder_by_id(child_id).await.unwrap().is_some());

        h.service.delete_folder_record(parent.id.unwrap()).await.unwrap();

        assert!(h.service.get_folder_by_id(child_id).await.unwrap().is_none());
        assert!(h.service.get_folder_by_id(parent.id.unwrap()).await.unwrap().is_none());
    }
}
