#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use library_server::{
    config::{AppConfig, StoreBackend},
    create_router,
    models::user::{Role, UserChanges},
    services::blob::LocalBlobStore,
    store::Stores,
    AppState,
};

pub const PASSWORD: &str = "secret123";
const BOUNDARY: &str = "library-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub stores: Stores,
    /// Kept alive for the duration of the test.
    pub uploads: TempDir,
}

pub fn test_config(uploads: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.auth.secret = "integration-test-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.uploads.dir = uploads.path().display().to_string();
    config
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

pub fn setup_test_app_with(customize: impl FnOnce(&mut AppConfig)) -> TestApp {
    let uploads = tempfile::tempdir().expect("Failed to create upload dir");
    let mut config = test_config(&uploads);
    customize(&mut config);

    let stores = Stores::memory();
    let blobs = Arc::new(LocalBlobStore::new(uploads.path()));
    let state = AppState::new(Arc::new(config), stores.clone(), blobs);

    TestApp {
        router: create_router(state.clone()),
        state,
        stores,
        uploads,
    }
}

pub struct Part {
    pub name: &'static str,
    pub file_name: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &'static str, file_name: &'static str, content_type: &'static str, data: Vec<u8>) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj<<>>endobj\ntrailer<<>>\n%%EOF\n".to_vec()
}

pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0]
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::HOST, "library.test")
        .body(Body::empty())
        .unwrap()
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: Vec<Part>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    with_auth(Request::builder().method(Method::POST).uri(uri), token)
        .header(header::HOST, "library.test")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

impl TestApp {
    pub async fn raw(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.raw(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(empty_request(Method::GET, uri, token)).await
    }

    pub async fn register(&self, name: &str, email: &str) -> (StatusCode, Value) {
        self.send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "name": name, "email": email, "password": PASSWORD }),
        ))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": email, "password": password }),
        ))
        .await
    }

    /// Registers and logs in, returning `(token, user id)`.
    pub async fn sign_up(&self, name: &str, email: &str) -> (String, String) {
        let (status, _) = self.register(name, email).await;
        assert_eq!(status, StatusCode::CREATED);
        self.sign_in(email).await
    }

    pub async fn sign_in(&self, email: &str) -> (String, String) {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().to_string();
        (token, id)
    }

    /// An admin account, promoted through the store and signed in afterwards
    /// so the token carries the role.
    pub async fn sign_up_admin(&self, name: &str, email: &str) -> (String, String) {
        self.sign_up(name, email).await;
        let user = self.stores.users.find_by_email(email).await.unwrap().unwrap();
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..UserChanges::default()
        };
        self.stores.users.update(&user.id.unwrap(), changes).await.unwrap();
        self.sign_in(email).await
    }

    pub async fn create_book(&self, token: &str, body: Value) -> Value {
        let (status, book) = self
            .send(json_request(Method::POST, "/api/books", Some(token), body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", book);
        book
    }

    pub fn upload_path(&self, relative: &str) -> PathBuf {
        self.uploads.path().join(relative)
    }

    /// Regular files anywhere under the upload dir, relative to it.
    pub fn stored_files(&self) -> Vec<String> {
        fn walk(dir: &std::path::Path, root: &std::path::Path, out: &mut Vec<String>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, root, out);
                } else {
                    out.push(path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut files = Vec::new();
        walk(self.uploads.path(), self.uploads.path(), &mut files);
        files.sort();
        files
    }
}
