mod common;

use std::collections::HashSet;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};

use common::{empty_request, json_request, setup_test_app};

fn ids(books: &Value) -> Vec<String> {
    books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_book_expands_owner_and_ignores_read_count() {
    let app = setup_test_app();
    let (token, user_id) = app.sign_up("Ada", "ada@example.com").await;

    let book = app
        .create_book(
            &token,
            json!({ "title": "Dune", "author": "Frank Herbert", "category": "SF", "readCount": 999 }),
        )
        .await;

    assert_eq!(book["title"], "Dune");
    assert_eq!(book["readCount"], 0);
    assert_eq!(book["published"], true);
    assert_eq!(book["available"], true);
    assert_eq!(book["uploadedBy"]["id"], user_id);
    assert_eq!(book["uploadedBy"]["name"], "Ada");
    assert_eq!(book["uploadedBy"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_create_book_requires_token_and_title() {
    let app = setup_test_app();
    let (status, _) = app
        .send(json_request(Method::POST, "/api/books", None, json!({ "title": "Dune" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (token, _) = app.sign_up("Ada", "ada@example.com").await;
    let (status, _) = app
        .send(json_request(Method::POST, "/api/books", Some(&token), json!({ "author": "Anon" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_public_listing_hides_unpublished_and_unavailable_books() {
    let app = setup_test_app();
    let (token, _) = app.sign_up("Ada", "ada@example.com").await;

    let visible = app.create_book(&token, json!({ "title": "Visible" })).await;
    let draft = app.create_book(&token, json!({ "title": "Draft", "published": false })).await;
    let lent = app.create_book(&token, json!({ "title": "Lent", "available": false })).await;

    let (status, listed) = app.get("/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&listed), vec![visible["id"].as_str().unwrap().to_string()]);

    let (_, published) = app.get("/api/books/published", None).await;
    assert_eq!(ids(&published), ids(&listed));

    // direct lookup is not filtered
    let uri = format!("/api/books/{}", draft["id"].as_str().unwrap());
    let (status, fetched) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Draft");
    assert_eq!(fetched["uploadedBy"]["name"], "Ada");

    let (_, mine) = app.get("/api/books/my-books", Some(&token)).await;
    let mine: HashSet<String> = ids(&mine).into_iter().collect();
    for book in [&visible, &draft, &lent] {
        assert!(mine.contains(book["id"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn test_published_listing_is_newest_first() {
    let app = setup_test_app();
    let (token, _) = app.sign_up("Ada", "ada@example.com").await;

    let first = app.create_book(&token, json!({ "title": "First" })).await;
    let second = app.create_book(&token, json!({ "title": "Second" })).await;

    let (_, published) = app.get("/api/books/published", None).await;
    assert_eq!(
        ids(&published),
        vec![
            second["id"].as_str().unwrap().to_string(),
            first["id"].as_str().unwrap().to_string()
        ]
    );
}

#[tokio::test]
async fn test_my_books_only_returns_own_books() {
    let app = setup_test_app();
    let (ada, _) = app.sign_up("Ada", "ada@example.com").await;
    let (bob, _) = app.sign_up("Bob", "bob@example.com").await;

    app.create_book(&ada, json!({ "title": "Ada's" })).await;
    let bobs = app.create_book(&bob, json!({ "title": "Bob's" })).await;

    let (_, mine) = app.get("/api/books/my-books", Some(&bob)).await;
    assert_eq!(ids(&mine), vec![bobs["id"].as_str().unwrap().to_string()]);
}

#[tokio::test]
async fn test_get_book_errors() {
    let app = setup_test_app();

    let (status, body) = app.get(&format!("/api/books/{}", mongodb::bson::oid::ObjectId::new()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book not found");

    let (status, _) = app.get("/api/books/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_applies_only_whitelisted_fields() {
    let app = setup_test_app();
    let (token, user_id) = app.sign_up("Ada", "ada@example.com").await;
    let book = app.create_book(&token, json!({ "title": "Dune" })).await;
    let uri = format!("/api/books/{}", book["id"].as_str().unwrap());

    let (status, updated) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&token),
            json!({
                "title": "Dune Messiah",
                "published": false,
                "readCount": 500,
                "uploadedBy": mongodb::bson::oid::ObjectId::new().to_hex(),
                "pdfFile": "uploads/elsewhere.pdf"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["published"], false);
    assert_eq!(updated["readCount"], 0);
    assert_eq!(updated["uploadedBy"]["id"], user_id);
    assert_eq!(updated["pdfFile"], Value::Null);
}

#[tokio::test]
async fn test_non_owner_cannot_update_or_delete() {
    let app = setup_test_app();
    let (owner, _) = app.sign_up("Ada", "ada@example.com").await;
    let (other, _) = app.sign_up("Bob", "bob@example.com").await;
    let book = app.create_book(&owner, json!({ "title": "Dune" })).await;
    let uri = format!("/api/books/{}", book["id"].as_str().unwrap());

    let (status, body) = app
        .send(json_request(Method::PUT, &uri, Some(&other), json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only edit your own books");

    let (status, _) = app.send(empty_request(Method::DELETE, &uri, Some(&other))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, survivor) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(survivor["title"], "Dune");
}

#[tokio::test]
async fn test_owner_and_admin_can_delete() {
    let app = setup_test_app();
    let (owner, _) = app.sign_up("Ada", "ada@example.com").await;
    let (admin, _) = app.sign_up_admin("Root", "root@example.com").await;

    let first = app.create_book(&owner, json!({ "title": "One" })).await;
    let second = app.create_book(&owner, json!({ "title": "Two" })).await;

    for (book, token) in [(&first, &owner), (&second, &admin)] {
        let uri = format!("/api/books/{}", book["id"].as_str().unwrap());
        let (status, body) = app.send(empty_request(Method::DELETE, &uri, Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book deleted");

        let (status, _) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_track_read_increments_and_guards_visibility() {
    let app = setup_test_app();
    let (token, _) = app.sign_up("Ada", "ada@example.com").await;
    let book = app.create_book(&token, json!({ "title": "Dune" })).await;
    let draft = app.create_book(&token, json!({ "title": "Draft", "published": false })).await;

    let uri = format!("/api/books/{}/read", book["id"].as_str().unwrap());
    let (status, body) = app.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book read tracked successfully");
    assert_eq!(body["readCount"], 1);
    assert_eq!(body["book"]["title"], "Dune");

    let (_, body) = app.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(body["readCount"], 2);

    let uri = format!("/api/books/{}/read", draft["id"].as_str().unwrap());
    let (status, body) = app.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Book is not available for reading");

    let uri = format!("/api/books/{}/read", mongodb::bson::oid::ObjectId::new());
    let (status, _) = app.send(empty_request(Method::POST, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_reads_are_all_counted() {
    let app = setup_test_app();
    let (token, _) = app.sign_up("Ada", "ada@example.com").await;
    let book = app.create_book(&token, json!({ "title": "Dune" })).await;
    let uri = format!("/api/books/{}/read", book["id"].as_str().unwrap());

    let reads = (0..25).map(|_| {
        let router = app.router.clone();
        let request = empty_request(Method::POST, &uri, Some(&token));
        tokio::spawn(async move {
            use tower::ServiceExt;
            router.oneshot(request).await.unwrap().status()
        })
    });
    for status in futures::future::join_all(reads).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let (_, fetched) = app.get(&format!("/api/books/{}", book["id"].as_str().unwrap()), None).await;
    assert_eq!(fetched["readCount"], 25);
}

#[tokio::test]
async fn test_malformed_book_body_gets_json_error() {
    let app = setup_test_app();
    let (token, _) = app.sign_up("Ada", "ada@example.com").await;

    let (status, body) = app
        .send(json_request(Method::POST, "/api/books", Some(&token), json!("not an object")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().starts_with("Failed to deserialize"));

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, body) = app.send(broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from("{\"title\": \"Dune\"}"))
        .unwrap();
    let (status, body) = app.send(untyped).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["message"].is_string());

    let (_, books) = app.get("/api/books/my-books", Some(&token)).await;
    assert!(books.as_array().unwrap().is_empty());
}
