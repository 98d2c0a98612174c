//! Integration tests for moving files within and across backends.

mod helpers;

use assethub_core::OperationResult;
use assethub_entity::ConflictResolution;
use assethub_service::MoveRequest;

#[tokio::test]
async fn test_move_to_same_folder_and_name_is_noop() {
    let app = helpers::TestApp::new().await;
    let folder = app.folder(app.uploads, "docs").await;
    let id = app.upload(&folder, "notes.txt", "n").await.file_id().unwrap();

    let result = app
        .service
        .move_files(&MoveRequest::new(vec![id], folder.id.unwrap()))
        .await;

    assert!(result.is_success());
    assert_eq!(result.file_id(), Some(id));
    assert_eq!(app.read("uploads", "docs/notes.txt"), "n");
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_batch_rename_is_rejected() {
    let app = helpers::TestApp::new().await;
    let folder = app.folder(app.uploads, "docs").await;
    let one = app.upload(&folder, "one.txt", "1").await.file_id().unwrap();
    let two = app.upload(&folder, "two.txt", "2").await.file_id().unwrap();

    let result = app
        .service
        .move_files(&MoveRequest::new(vec![one, two], folder.id.unwrap()).rename("three"))
        .await;

    assert!(result.is_error());
    assert_eq!(
        result.error_message(),
        Some("It’s not possible to rename multiple files!")
    );
    assert!(app.exists("uploads", "docs/one.txt"));
    assert!(app.exists("uploads", "docs/two.txt"));
}

#[tokio::test]
async fn test_cross_backend_move_removes_scratch_copy() {
    let app = helpers::TestApp::new().await;
    let source = app.folder(app.uploads, "docs").await;
    let dest = app.folder(app.archive, "2024").await;
    let id = app.upload(&source, "notes.txt", "payload").await.file_id().unwrap();

    let result = app
        .service
        .move_files(&MoveRequest::new(vec![id], dest.id.unwrap()))
        .await;

    assert!(result.is_success());
    assert_eq!(app.read("archive", "2024/notes.txt"), "payload");
    assert!(!app.exists("uploads", "docs/notes.txt"));
    let moved = app.service.get_file_by_id(id).await.unwrap().unwrap();
    assert_eq!(moved.backend_id, app.archive);
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_failed_cross_backend_move_removes_scratch_copy() {
    let app = helpers::TestApp::new().await;
    let source = app.folder(app.uploads, "docs").await;
    let dest = app.folder(app.archive, "2024").await;
    let id = app.upload(&source, "notes.txt", "moving").await.file_id().unwrap();
    app.upload(&dest, "notes.txt", "resident").await;

    let result = app
        .service
        .move_files(&MoveRequest::new(vec![id], dest.id.unwrap()))
        .await;

    assert!(result.is_conflict());
    assert!(app.exists("uploads", "docs/notes.txt"));
    assert_eq!(app.read("archive", "2024/notes.txt"), "resident");
    let unmoved = app.service.get_file_by_id(id).await.unwrap().unwrap();
    assert_eq!(unmoved.backend_id, app.uploads);
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_cross_backend_move_with_keep_both() {
    let app = helpers::TestApp::new().await;
    let source = app.folder(app.uploads, "docs").await;
    let dest = app.folder(app.archive, "2024").await;
    let id = app.upload(&source, "notes.txt", "moving").await.file_id().unwrap();
    app.upload(&dest, "notes.txt", "resident").await;

    let result = app
        .service
        .move_files(
            &MoveRequest::new(vec![id], dest.id.unwrap())
                .actions(vec![Some(ConflictResolution::KeepBoth)]),
        )
        .await;

    assert!(result.is_success());
    assert_eq!(app.read("archive", "2024/notes.txt"), "resident");
    assert_eq!(app.read("archive", "2024/notes_1.txt"), "moving");
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_batch_move_reports_items() {
    let app = helpers::TestApp::new().await;
    let source = app.folder(app.uploads, "docs").await;
    let dest = app.folder(app.uploads, "done").await;
    let one = app.upload(&source, "one.txt", "1").await.file_id().unwrap();
    let two = app.upload(&source, "two.txt", "2").await.file_id().unwrap();

    let result = app
        .service
        .move_files(&MoveRequest::new(vec![one, two], dest.id.unwrap()))
        .await;

    assert!(result.is_success());
    let items: Vec<OperationResult> = result.data_as("results").unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(OperationResult::is_success));
    assert!(app.exists("uploads", "done/one.txt"));
    assert!(app.exists("uploads", "done/two.txt"));
}
