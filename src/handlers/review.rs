use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    dto::{
        review::{CreateReviewRequest, ReviewEnvelope, ReviewListQuery, ReviewResponse, UpdateReviewRequest},
        ErrorResponse, MessageResponse,
    },
    error::AppResult,
    middleware::json::AppJson,
    models::{parse_id, review::ReviewChanges, user::AuthUser},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewListQuery),
    responses((status = 200, description = "Reviews, newest first", body = [ReviewResponse])),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    let book = match query.book_id.as_deref().filter(|id| !id.is_empty()) {
        Some(raw) => Some(parse_id(raw)?),
        None => None,
    };
    Ok(Json(state.reviews.list(book).await?))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added", body = ReviewEnvelope),
        (status = 400, description = "Bad rating, bad book id, or already reviewed", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
pub async fn add_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(request): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewEnvelope>)> {
    let book = parse_id(&request.book)?;
    let review = state
        .reviews
        .add(book, request.rating, request.comment, &caller)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewEnvelope {
            message: "Review added successfully".to_string(),
            review,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewEnvelope),
        (status = 404, description = "No review with this id by the caller", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<ReviewEnvelope>> {
    let id = parse_id(&id)?;
    let changes = ReviewChanges {
        rating: request.rating,
        comment: request.comment,
    };
    let review = state.reviews.update(&id, changes, &caller).await?;

    Ok(Json(ReviewEnvelope {
        message: "Review updated".to_string(),
        review,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 404, description = "No review with this id by the caller", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.reviews.delete(&id, &caller).await?;
    Ok(Json(MessageResponse::new("Review deleted")))
}

#[utoipa::path(
    get,
    path = "/api/reviews/user/my-reviews",
    responses(
        (status = 200, description = "Caller's reviews with their books", body = [ReviewResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "reviews"
)]
pub async fn list_my_reviews(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AppResult<Json<Vec<ReviewResponse>>> {
    Ok(Json(state.reviews.list_own(&caller).await?))
}
