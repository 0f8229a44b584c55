mod common;

use axum::{
    body::to_bytes,
    http::{header, Method, StatusCode},
};

use common::{empty_request, pdf_bytes, setup_test_app};

#[tokio::test]
async fn test_health_reports_running() {
    let app = setup_test_app();

    let (status, body) = app.get("/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Server is running");
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_uploads_listing_shows_top_level_files() {
    let app = setup_test_app();
    std::fs::write(app.upload_path("a.pdf"), pdf_bytes()).unwrap();
    std::fs::create_dir_all(app.upload_path("avatars")).unwrap();
    std::fs::write(app.upload_path("avatars/x.png"), b"png").unwrap();

    let (status, body) = app.get("/api/test-uploads", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["files"][0]["name"], "a.pdf");
    assert_eq!(body["files"][0]["size"], pdf_bytes().len());
    assert_eq!(body["files"][0]["url"], "http://library.test/uploads/a.pdf");
    assert_eq!(body["serverUrl"], "http://library.test");
}

#[tokio::test]
async fn test_uploads_listing_creates_missing_directory() {
    let app = setup_test_app();
    std::fs::remove_dir(app.uploads.path()).unwrap();

    let (status, body) = app.get("/api/test-uploads", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(app.uploads.path().is_dir());
}

#[tokio::test]
async fn test_download_streams_pdf_attachment() {
    let app = setup_test_app();
    std::fs::write(app.upload_path("book.pdf"), pdf_bytes()).unwrap();

    let response = app.raw(empty_request(Method::GET, "/download/book.pdf", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"book.pdf\"");
    assert_eq!(headers[header::CONTENT_LENGTH], pdf_bytes().len().to_string().as_str());
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.to_vec(), pdf_bytes());
}

#[tokio::test]
async fn test_download_missing_or_escaping_names_are_not_found() {
    let app = setup_test_app();
    let outside = app.uploads.path().parent().unwrap().join("outside-secret.pdf");
    std::fs::write(&outside, b"secret").unwrap();

    let (status, body) = app.get("/download/nothing.pdf", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "File not found");

    let (status, _) = app.get("/download/..%2Foutside-secret.pdf", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    std::fs::remove_file(outside).unwrap();
}

#[tokio::test]
async fn test_api_docs_are_served() {
    let app = setup_test_app();

    let (status, doc) = app.get("/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/books"].is_object());
    assert!(doc["paths"]["/api/books/{id}/read"]["post"].is_object());
}
