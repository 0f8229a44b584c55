use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserResponse;
use crate::models::user::Role;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Accepted for compatibility and ignored: new accounts are always `user`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// JWT payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Hex ObjectId of the user
    pub id: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}
