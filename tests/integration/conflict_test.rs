//! Integration tests for settling upload conflicts.

mod helpers;

use assethub_core::types::AssetId;
use assethub_entity::{AssetCriteria, ConflictResolution};
use assethub_service::{MergeContext, UploadRequest};

async fn conflicting_upload(app: &helpers::TestApp) -> (AssetId, MergeContext, assethub_entity::Folder) {
    let folder = app.folder(app.uploads, "reports").await;
    let original = app
        .upload(&folder, "q1.pdf", "first")
        .await
        .file_id()
        .expect("stored");
    let conflict = app.upload(&folder, "q1.pdf", "second").await;
    assert!(conflict.is_conflict());
    assert!(conflict.prompt().is_some());

    let merge = MergeContext::from_conflict(&conflict, ConflictResolution::Cancel)
        .expect("conflict carries the incoming file");
    (original, merge, folder)
}

#[tokio::test]
async fn test_keep_both_keeps_numbered_copy() {
    let app = helpers::TestApp::new().await;
    let (original, merge, folder) = conflicting_upload(&app).await;
    let merge = MergeContext {
        resolution: ConflictResolution::KeepBoth,
        ..merge
    };

    let result = app
        .service
        .upload_file(folder.id.unwrap(), UploadRequest::Resolve(merge.clone()))
        .await;

    assert!(result.is_success());
    assert_eq!(result.file_id(), Some(merge.conflicting_file_id));
    assert_ne!(result.file_id(), Some(original));
    assert_eq!(app.read("uploads", "reports/q1.pdf"), "first");
    assert_eq!(app.read("uploads", "reports/q1_1.pdf"), "second");
    let total = app
        .service
        .get_total_files(&AssetCriteria::default().folder(folder.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_replace_overwrites_bytes_and_keeps_identity() {
    let app = helpers::TestApp::new().await;
    let (original, merge, folder) = conflicting_upload(&app).await;
    let merge = MergeContext {
        resolution: ConflictResolution::Replace,
        ..merge
    };

    let result = app.service.resolve_conflict(&merge).await;

    assert!(result.is_success());
    assert_eq!(result.file_id(), Some(original));
    assert_eq!(app.read("uploads", "reports/q1.pdf"), "second");
    assert!(!app.exists("uploads", "reports/q1_1.pdf"));
    assert!(app
        .service
        .get_file_by_id(merge.conflicting_file_id)
        .await
        .unwrap()
        .is_none());
    let total = app
        .service
        .get_total_files(&AssetCriteria::default().folder(folder.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_cancel_discards_incoming_copy() {
    let app = helpers::TestApp::new().await;
    let (original, merge, _) = conflicting_upload(&app).await;

    let result = app.service.resolve_conflict(&merge).await;

    assert!(result.is_success());
    assert_eq!(app.read("uploads", "reports/q1.pdf"), "first");
    assert!(!app.exists("uploads", "reports/q1_1.pdf"));
    assert!(app.service.get_file_by_id(original).await.unwrap().is_some());
    assert!(app
        .service
        .get_file_by_id(merge.conflicting_file_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_insert_by_local_path_resolves_immediately() {
    let app = helpers::TestApp::new().await;
    let folder = app.folder(app.uploads, "reports").await;
    let original = app.upload(&folder, "q1.pdf", "first").await.file_id().unwrap();
    let local = app.dir.path().join("q1-final.pdf");
    std::fs::write(&local, "final").unwrap();

    let result = app
        .service
        .insert_file_by_local_path(&local, "q1.pdf", folder.id.unwrap(), Some(ConflictResolution::Replace))
        .await;

    assert!(result.is_success());
    assert_eq!(result.file_id(), Some(original));
    assert_eq!(app.read("uploads", "reports/q1.pdf"), "final");
}
