use axum::{extract::State, Extension, Json};

use crate::{
    dto::{
        admin::{DashboardStats, ManageUserRequest, ManageUserResponse, UserAction},
        ErrorResponse,
    },
    error::AppResult,
    middleware::json::AppJson,
    models::{parse_id, user::AuthUser},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Collection totals", body = DashboardStats),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.admin.dashboard_stats().await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = ManageUserRequest,
    responses(
        (status = 200, description = "Action applied", body = ManageUserResponse),
        (status = 400, description = "Bad id or action on own account", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn manage_users(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    AppJson(request): AppJson<ManageUserRequest>,
) -> AppResult<Json<ManageUserResponse>> {
    let target = parse_id(&request.user_id)?;
    let user = state.admin.manage_user(request.action, &target, &admin).await?;

    let message = match request.action {
        UserAction::Promote => "User promoted to admin",
        UserAction::Demote => "User demoted to user",
        UserAction::Delete => "User deleted",
    };
    Ok(Json(ManageUserResponse {
        message: message.to_string(),
        user: user.map(Into::into),
    }))
}
