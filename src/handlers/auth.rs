use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        user::UserResponse,
        ErrorResponse,
    },
    error::AppResult,
    middleware::json::AppJson,
    models::user::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing fields or email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    tracing::info!("Registration attempt for {}", request.email);
    let user = state.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    tracing::info!("Login attempt for {}", request.email);
    let (token, user) = state.auth.login(request).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.profile(&caller).await?;
    Ok(Json(user.into()))
}
