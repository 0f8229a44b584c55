use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use tokio_util::io::ReaderStream;

use super::server_url;
use crate::{
    dto::{
        system::{HealthResponse, StoredFileInfo, UploadsListing},
        ErrorResponse,
    },
    error::{AppError, AppResult},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Liveness probe", body = HealthResponse)),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[utoipa::path(
    get,
    path = "/api/test-uploads",
    responses(
        (status = 200, description = "Contents of the upload directory", body = UploadsListing),
        (status = 500, description = "Upload directory unreadable", body = ErrorResponse)
    ),
    tag = "system"
)]
pub async fn test_uploads(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<UploadsListing>> {
    let server_url = server_url(&headers);
    let files: Vec<StoredFileInfo> = state
        .blobs
        .list()
        .await?
        .into_iter()
        .map(|blob| StoredFileInfo {
            url: format!("{}/uploads/{}", server_url, blob.name),
            created: blob
                .created
                .map(|c| c.to_rfc3339_opts(SecondsFormat::Millis, true)),
            name: blob.name,
            size: blob.size,
        })
        .collect();

    Ok(Json(UploadsListing {
        status: "Uploads directory exists".to_string(),
        path: state.blobs.location(),
        count: files.len(),
        files,
        server_url,
    }))
}

/// Streams a top-level upload as a PDF attachment. Anything that is not a
/// plain file name reports as missing.
#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File contents", content_type = "application/pdf"),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    tag = "system"
)]
pub async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> AppResult<Response> {
    let not_found = || AppError::NotFound("File not found".to_string());
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        tracing::warn!("Rejected download of {:?}", filename);
        return Err(not_found());
    }

    let blob = state.blobs.open(&filename).await?.ok_or_else(not_found)?;
    tracing::info!("Streaming {} ({} bytes)", filename, blob.size);

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        (header::CONTENT_LENGTH, blob.size.to_string()),
        (header::CACHE_CONTROL, "no-cache".to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(blob.reader));
    Ok((headers, body).into_response())
}
