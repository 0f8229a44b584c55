mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{json_request, setup_test_app, PASSWORD};

#[tokio::test]
async fn test_register_returns_identity_without_password() {
    let app = setup_test_app();

    let (status, body) = app.register("Ada", "ada@example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());

    let stored = app.stores.users.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_ne!(stored.password, PASSWORD);
    assert!(stored.password.starts_with("$2"));
}

#[tokio::test]
async fn test_register_ignores_requested_admin_role() {
    let app = setup_test_app();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "name": "Mallory", "email": "m@example.com", "password": PASSWORD, "role": "admin" }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected() {
    let app = setup_test_app();
    app.register("Ada", "ada@example.com").await;

    let (status, body) = app.register("Other Ada", "ada@example.com").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");
    assert_eq!(app.stores.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let app = setup_test_app();

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "name": "", "email": "x@example.com", "password": PASSWORD }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stores.users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = setup_test_app();
    app.register("Ada", "ada@example.com").await;

    let (wrong_status, wrong_password) = app.login("ada@example.com", "not-the-password").await;
    let (unknown_status, unknown_email) = app.login("nobody@example.com", PASSWORD).await;

    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_issues_token_accepted_by_profile() {
    let app = setup_test_app();
    app.register("Ada", "ada@example.com").await;

    let (status, body) = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["token"].as_str().unwrap();

    let (status, profile) = app.get("/api/auth/profile", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ada@example.com");
    assert!(profile.get("password").is_none());
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = setup_test_app();

    let (status, body) = app.get("/api/auth/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = app.get("/api/auth/profile", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/books/my-books", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let app = setup_test_app();
    let other = common::setup_test_app_with(|config| config.auth.secret = "someone-else".to_string());
    let (token, _) = other.sign_up("Eve", "eve@example.com").await;

    let (status, _) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_of_deleted_user_is_not_found() {
    let app = setup_test_app();
    let (token, id) = app.sign_up("Ada", "ada@example.com").await;
    let id = mongodb::bson::oid::ObjectId::parse_str(&id).unwrap();
    app.stores.users.delete(&id).await.unwrap();

    let (status, body) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
