use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{hex_id, timestamp};
use crate::models::user::{Role, User};

/// Public view of a user; the password hash is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: hex_id(user.id),
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            created_at: timestamp(user.created_at),
        }
    }
}

/// Expanded reference to a user. Only `id` is set when the user no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserSummary {
    pub fn id_only(id: String) -> Self {
        Self {
            id,
            name: None,
            email: None,
            avatar: None,
        }
    }

    /// Name and email, as shown on books.
    pub fn owner(user: &User) -> Self {
        Self {
            id: hex_id(user.id),
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            avatar: None,
        }
    }

    /// Name, email and avatar, as shown on reviews.
    pub fn author(user: &User) -> Self {
        Self {
            avatar: Some(user.avatar.clone()),
            ..Self::owner(user)
        }
    }
}

/// Self-service profile update; only name and email are writable.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Admin update of any user field.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub message: String,
    pub user: UserResponse,
    pub avatar_url: String,
}
