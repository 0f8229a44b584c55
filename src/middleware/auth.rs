use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::user::AuthUser, AppState};

pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Verifies the bearer token and stores the caller's [`AuthUser`] in the
    /// request extensions for the handlers behind it.
    pub async fn auth_middleware(
        State(state): State<AppState>,
        headers: HeaderMap,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let token = match extract_token_from_headers(&headers) {
            Some(token) => token,
            None => {
                tracing::debug!("No bearer token on {}", request.uri().path());
                return Err(AppError::Unauthorized("No token, authorization denied".to_string()));
            }
        };

        let user = match state.auth.validate_token(token) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Token validation failed: {}", e);
                return Err(AppError::Unauthorized("Token is not valid".to_string()));
            }
        };

        tracing::debug!("Authenticated {} as {}", user.id, user.role.as_str());
        request.extensions_mut().insert(user);

        Ok(next.run(request).await)
    }

    /// Must sit behind [`AuthMiddleware::auth_middleware`].
    pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
        match request.extensions().get::<AuthUser>() {
            Some(user) if user.is_admin() => Ok(next.run(request).await),
            Some(user) => {
                tracing::debug!("require_admin: {} is not an admin", user.id);
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
            None => Err(AppError::Unauthorized("No token, authorization denied".to_string())),
        }
    }
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
