//! Integration tests for folder lookups and trees.

mod helpers;

use assethub_core::types::FolderId;
use assethub_service::RequestContext;

#[tokio::test]
async fn test_unknown_folder_stays_absent() {
    let app = helpers::TestApp::new().await;
    let id = FolderId::new();

    for _ in 0..3 {
        assert!(app.service.get_folder_by_id(id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_folder_tree_spans_backends_in_sort_order() {
    let app = helpers::TestApp::new().await;
    let docs = app.folder(app.uploads, "docs").await;
    app.service.create_folder(docs.id.unwrap(), "drafts").await;
    app.folder(app.archive, "2024").await;

    let tree = app
        .service
        .get_folder_tree_by_backend_ids(&[app.archive, app.uploads])
        .await
        .unwrap();

    let roots: Vec<_> = tree.roots().map(|f| f.backend_id).collect();
    assert_eq!(roots, vec![app.uploads, app.archive]);

    let nodes = serde_json::to_value(tree.to_nodes()).unwrap();
    assert_eq!(nodes.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_folder_lives_in_staging() {
    let app = helpers::TestApp::new().await;
    let ctx = RequestContext::anonymous("session-1");

    let folder = app.service.get_user_folder(&ctx).await.unwrap();

    assert_eq!(folder.backend_id, app.staging);
    assert!(app.dir.path().join("staging").join(&folder.path).exists());
    assert_eq!(app.service.get_user_folder(&ctx).await.unwrap().id, folder.id);
}

#[tokio::test]
async fn test_delete_folder_removes_files() {
    let app = helpers::TestApp::new().await;
    let docs = app.folder(app.uploads, "docs").await;
    let id = app.upload(&docs, "a.txt", "a").await.file_id().unwrap();

    let result = app.service.delete_folder(docs.id.unwrap()).await;

    assert!(result.is_success());
    assert!(!app.exists("uploads", "docs"));
    assert!(app.service.get_file_by_id(id).await.unwrap().is_none());
}
