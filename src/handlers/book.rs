use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};

use super::server_url;
use crate::{
    dto::{
        book::{BookResponse, CoverUploadResponse, CreateBookRequest, ReadTrackResponse, UpdateBookRequest},
        non_blank, ErrorResponse, MessageResponse,
    },
    error::{AppError, AppResult},
    middleware::{
        json::AppJson,
        upload::{CoverUpload, PdfUpload, Upload},
    },
    models::{book::NewBook, parse_id, user::AuthUser},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/books",
    responses((status = 200, description = "Published and available books", body = [BookResponse])),
    tag = "books"
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    Ok(Json(state.books.list_public().await?))
}

#[utoipa::path(
    get,
    path = "/api/books/published",
    responses((status = 200, description = "Readable books, newest publication first", body = [BookResponse])),
    tag = "books"
)]
pub async fn list_published_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    Ok(Json(state.books.list_published().await?))
}

#[utoipa::path(
    get,
    path = "/api/books/my-books",
    responses(
        (status = 200, description = "Books uploaded by the caller", body = [BookResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn list_my_books(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AppResult<Json<Vec<BookResponse>>> {
    Ok(Json(state.books.list_own(&caller).await?))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    tag = "books"
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<BookResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.books.get(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(request): AppJson<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.books.create(request.into(), &caller).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Multipart form: `pdfFile` plus text fields title, author, description,
/// category and coverImage.
#[utoipa::path(
    post,
    path = "/api/books/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "pdfFile and book fields"),
    responses(
        (status = 201, description = "Book created with its PDF", body = BookResponse),
        (status = 400, description = "Missing or rejected PDF", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn create_book_with_file(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    upload: Upload<PdfUpload>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let fields = NewBook {
        title: upload.field("title").unwrap_or_default(),
        author: non_blank(upload.field("author")),
        description: non_blank(upload.field("description")),
        category: non_blank(upload.field("category")),
        cover_image: non_blank(upload.field("coverImage")),
        ..NewBook::default()
    };

    let book = state.books.create_with_file(fields, upload.file, &caller).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    post,
    path = "/api/books/upload-cover",
    request_body(content = String, content_type = "multipart/form-data", description = "coverImage"),
    responses(
        (status = 201, description = "Cover stored", body = CoverUploadResponse),
        (status = 400, description = "Missing or rejected image", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn upload_cover_image(
    headers: HeaderMap,
    upload: Upload<CoverUpload>,
) -> AppResult<(StatusCode, Json<CoverUploadResponse>)> {
    let Some(file) = upload.file else {
        return Err(AppError::BadRequest("Image file is required".to_string()));
    };

    let full_url = format!("{}/{}", server_url(&headers), file.public_path);
    tracing::info!("Cover image uploaded: {}", file.public_path);

    Ok((
        StatusCode::CREATED,
        Json(CoverUploadResponse {
            message: "Cover image uploaded successfully".to_string(),
            image_url: file.public_path,
            full_url,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/read",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Read counted", body = ReadTrackResponse),
        (status = 403, description = "Book is not published or not available", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn track_read(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<ReadTrackResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.books.track_read(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 403, description = "Caller neither owns the book nor is an admin", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateBookRequest>,
) -> AppResult<Json<BookResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.books.update(&id, request.into(), &caller).await?))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 403, description = "Caller neither owns the book nor is an admin", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.books.delete(&id, &caller).await?;
    Ok(Json(MessageResponse::new("Book deleted")))
}
