pub mod admin;
pub mod auth;
pub mod book;
pub mod review;
pub mod system;
pub mod user;

use axum::http::{header, HeaderMap};

/// `<scheme>://<host>` as seen by the client, honouring `X-Forwarded-Proto`.
pub(crate) fn server_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}
