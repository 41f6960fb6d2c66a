//! Web API File Tests
//!
//! Integration tests for the file listing, download, metadata and upload endpoints.

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use filegate::config::FilesConfig;
use filegate::web::handlers::AppState;
use filegate::web::router::create_router;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const MIB: usize = 1024 * 1024;

/// Create a test server over `<temp>/store`, with a file outside the store.
fn create_test_server() -> (TestServer, TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().join("store");
    std::fs::create_dir(&root).expect("Failed to create store");
    std::fs::write(temp_dir.path().join("secret"), b"outside the store").unwrap();

    let server = server_for(&root);
    (server, temp_dir, root)
}

fn server_for(root: &Path) -> TestServer {
    let config = FilesConfig {
        storage_path: root.to_str().unwrap().to_string(),
        ..Default::default()
    };
    let app_state = Arc::new(AppState::from_config(&config));
    TestServer::new(create_router(app_state)).expect("Failed to create test server")
}

fn file_form(content: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(content).file_name("upload.txt"))
}

/// Upload content and return the generated filename.
async fn upload(server: &TestServer, content: &[u8]) -> String {
    let response = server.post("/files").multipart(file_form(content.to_vec())).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    body["filename"].as_str().unwrap().to_string()
}

fn listed_names(body: &Value) -> Vec<String> {
    body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap().to_string())
        .collect()
}

fn store_entries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_files_empty() {
    let (server, _temp, _root) = create_test_server();

    let response = server.get("/files").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_files_only_visible_regular_files() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::write(root.join(".gitignore"), b"*").unwrap();
    std::fs::create_dir(root.join("subdir")).unwrap();
    std::fs::write(root.join("subdir").join("nested.txt"), b"n").unwrap();

    let response = server.get("/files").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(listed_names(&body), vec!["a.txt"]);
    assert_eq!(body["files"][0].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_files_newest_first() {
    let (server, _temp, root) = create_test_server();

    for name in ["first.txt", "second.txt", "third.txt"] {
        std::fs::write(root.join(name), name).unwrap();
        // Keep change times apart even on filesystems with coarse timestamps
        tokio::time::sleep(Duration::from_millis(1100)).await;
    }

    let response = server.get("/files").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        listed_names(&body),
        vec!["third.txt", "second.txt", "first.txt"]
    );
}

#[tokio::test]
async fn test_list_files_missing_store_is_server_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = server_for(&temp_dir.path().join("does-not-exist"));

    let response = server.get("/files").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Error retrieving files");
}

// ============================================================================
// Download Tests
// ============================================================================

#[tokio::test]
async fn test_download_file() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("notes.txt"), b"some notes").unwrap();

    let response = server.get("/files/notes.txt").await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"some notes");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"notes.txt\""
    );
    assert!(response
        .header(header::CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_download_missing_file() {
    let (server, _temp, _root) = create_test_server();

    let response = server.get("/files/missing.txt").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_dotfile_not_found() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join(".env"), b"SECRET=1").unwrap();

    let response = server.get("/files/.env").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(!response.text().contains("SECRET"));
}

#[tokio::test]
async fn test_download_directory_not_found() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("subdir")).unwrap();

    let response = server.get("/files/subdir").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_path_traversal_not_found() {
    let (server, _temp, _root) = create_test_server();

    for path in ["/files/..%2Fsecret", "/files/%2E%2E%2Fsecret", "/files/..%5Csecret"] {
        let response = server.get(path).await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(
            !response.text().contains("outside the store"),
            "leaked content for {path}"
        );
    }
}

// ============================================================================
// Metadata Tests
// ============================================================================

#[tokio::test]
async fn test_file_meta() {
    let (server, _temp, root) = create_test_server();
    std::fs::write(root.join("data.txt"), vec![b'x'; 2000]).unwrap();

    let response = server.get("/files/data.txt/meta").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["filename"], "data.txt");
    assert_eq!(body["size"], 2000);
    assert!(body["blocks"].as_u64().is_some());

    let created_at = body["createdAt"].as_str().unwrap();
    assert!(created_at.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
}

#[tokio::test]
async fn test_file_meta_directory_and_dotfile_not_found() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("subdir")).unwrap();
    std::fs::write(root.join(".hidden"), b"h").unwrap();

    for path in [
        "/files/subdir/meta",
        "/files/.hidden/meta",
        "/files/missing.txt/meta",
        "/files/..%2Fsecret/meta",
    ] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_to_directory_invisible() {
    let (server, _temp, root) = create_test_server();
    std::fs::create_dir(root.join("sub")).unwrap();
    std::os::unix::fs::symlink(root.join("sub"), root.join("dirlink")).unwrap();
    std::fs::write(root.join("plain.txt"), b"p").unwrap();

    let response = server.get("/files").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(listed_names(&body), vec!["plain.txt"]);

    server
        .get("/files/dirlink")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/files/dirlink/meta")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_generates_name() {
    let (server, _temp, root) = create_test_server();

    let filename = upload(&server, b"hello").await;

    assert!(filename.ends_with(".txt"));
    let id = filename.trim_end_matches(".txt");
    assert_eq!(id.len(), 36);
    assert_eq!(id, id.to_uppercase());
    assert_eq!(store_entries(&root), vec![filename]);
}

#[tokio::test]
async fn test_upload_ignores_client_filename() {
    let (server, temp, root) = create_test_server();

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"evil".to_vec()).file_name("../escaped.txt"));
    let response = server.post("/files").multipart(form).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["filename"], "../escaped.txt");
    assert!(!temp.path().join("escaped.txt").exists());
    assert_eq!(store_entries(&root).len(), 1);
}

#[tokio::test]
async fn test_upload_roundtrip() {
    let (server, _temp, _root) = create_test_server();
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let filename = upload(&server, &content).await;

    let response = server.get(&format!("/files/{filename}")).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), content.as_slice());

    let response = server.get(&format!("/files/{filename}/meta")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["filename"], filename.as_str());
    assert_eq!(body["size"], 10_000);
}

#[tokio::test]
async fn test_sequential_uploads_distinct_and_retrievable() {
    let (server, _temp, _root) = create_test_server();

    let first = upload(&server, b"first upload").await;
    let second = upload(&server, b"second upload").await;

    assert_ne!(first, second);

    let response = server.get(&format!("/files/{first}")).await;
    assert_eq!(response.as_bytes().as_ref(), b"first upload");
    let response = server.get(&format!("/files/{second}")).await;
    assert_eq!(response.as_bytes().as_ref(), b"second upload");

    let body: Value = server.get("/files").await.json();
    let mut names = listed_names(&body);
    names.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_upload_exactly_one_mib() {
    let (server, _temp, root) = create_test_server();

    let filename = upload(&server, &vec![b'a'; MIB]).await;

    let size = std::fs::metadata(root.join(&filename)).unwrap().len();
    assert_eq!(size, MIB as u64);
}

#[tokio::test]
async fn test_upload_one_byte_over_limit_rejected() {
    let (server, _temp, root) = create_test_server();

    let response = server
        .post("/files")
        .multipart(file_form(vec![b'a'; MIB + 1]))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store_entries(&root).is_empty());
}

#[tokio::test]
async fn test_upload_far_over_body_limit_rejected() {
    let (server, _temp, root) = create_test_server();

    let response = server
        .post("/files")
        .multipart(file_form(vec![b'a'; 3 * MIB]))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store_entries(&root).is_empty());
}

#[tokio::test]
async fn test_upload_two_files_rejected() {
    let (server, _temp, root) = create_test_server();

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"one".to_vec()).file_name("one.txt"))
        .add_part("other", Part::bytes(b"two".to_vec()).file_name("two.txt"));
    let response = server.post("/files").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(store_entries(&root).is_empty());
}

#[tokio::test]
async fn test_upload_long_field_name_rejected() {
    let (server, _temp, root) = create_test_server();

    let form = MultipartForm::new().add_part(
        "f".repeat(101),
        Part::bytes(b"data".to_vec()).file_name("data.txt"),
    );
    let response = server.post("/files").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(store_entries(&root).is_empty());
}

#[tokio::test]
async fn test_upload_field_name_at_limit_accepted() {
    let (server, _temp, _root) = create_test_server();

    let form = MultipartForm::new().add_part(
        "f".repeat(100),
        Part::bytes(b"data".to_vec()).file_name("data.txt"),
    );
    let response = server.post("/files").multipart(form).await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_upload_text_fields_ignored() {
    let (server, _temp, root) = create_test_server();

    let form = MultipartForm::new()
        .add_text("description", "a note")
        .add_part("file", Part::bytes(b"content".to_vec()).file_name("c.txt"));
    let response = server.post("/files").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(store_entries(&root).len(), 1);
}

#[tokio::test]
async fn test_upload_without_file_rejected() {
    let (server, _temp, root) = create_test_server();

    let form = MultipartForm::new().add_text("description", "no file here");
    let response = server.post("/files").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No file provided");
    assert!(store_entries(&root).is_empty());
}

#[tokio::test]
async fn test_upload_into_missing_store_is_server_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = server_for(&temp_dir.path().join("does-not-exist"));

    let response = server.post("/files").multipart(file_form(b"x".to_vec())).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Failed to save file");
}
