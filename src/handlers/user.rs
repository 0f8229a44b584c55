use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::{
    dto::{
        user::{AvatarResponse, UpdateProfileRequest, UpdateUserRequest, UserEnvelope, UserResponse},
        ErrorResponse, MessageResponse,
    },
    error::{AppError, AppResult},
    middleware::{
        json::AppJson,
        upload::{AvatarUpload, Upload},
    },
    models::{parse_id, user::AuthUser},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "All users", body = [UserResponse])),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<UserResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(state.users.get(&id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> AppResult<Json<UserEnvelope>> {
    let id = parse_id(&id)?;
    let user = state.users.update_user(&id, request).await?;
    Ok(Json(UserEnvelope {
        message: "User updated".to_string(),
        user: user.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state.users.delete_user(&id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.auth.profile(&caller).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserEnvelope),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<UserEnvelope>> {
    let user = state.users.update_profile(&caller, request).await?;
    Ok(Json(UserEnvelope {
        message: "Profile updated successfully".to_string(),
        user: user.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/users/avatar",
    request_body(content = String, content_type = "multipart/form-data", description = "avatar"),
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "Missing or rejected image", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    upload: Upload<AvatarUpload>,
) -> AppResult<Json<AvatarResponse>> {
    let Some(file) = upload.file else {
        return Err(AppError::BadRequest("No avatar file uploaded".to_string()));
    };

    let (user, avatar_url) = state.users.upload_avatar(&caller, file).await?;
    Ok(Json(AvatarResponse {
        message: "Avatar updated successfully".to_string(),
        user: user.into(),
        avatar_url,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/avatar",
    responses(
        (status = 200, description = "Avatar reset to the placeholder", body = UserEnvelope),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AppResult<Json<UserEnvelope>> {
    let user = state.users.delete_avatar(&caller).await?;
    Ok(Json(UserEnvelope {
        message: "Avatar deleted successfully".to_string(),
        user: user.into(),
    }))
}
