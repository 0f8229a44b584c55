use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_books: u64,
    pub published_books: u64,
    pub total_reviews: u64,
    pub total_reads: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Promote,
    Demote,
    Delete,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManageUserRequest {
    pub action: UserAction,
    pub user_id: String,
}

/// `user` is absent after a delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManageUserResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}
