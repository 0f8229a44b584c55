use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_AVATAR: &str = "https://i.pravatar.cc/80?img=8";

/// Avatars stored by this server live under this public prefix.
pub const LOCAL_AVATAR_PREFIX: &str = "/uploads/avatars/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// User document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never leaves the server
    pub password: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: None,
            name,
            email,
            password: password_hash,
            avatar: default_avatar(),
            role: Role::User,
            created_at: DateTime::now(),
        }
    }

    /// Blob key of the avatar when it was uploaded to this server, `None` for
    /// the placeholder or any external URL.
    pub fn local_avatar_key(&self) -> Option<String> {
        self.avatar
            .strip_prefix(LOCAL_AVATAR_PREFIX)
            .filter(|name| !name.is_empty())
            .map(|name| format!("avatars/{}", name))
    }
}

/// Partial update applied by the user store; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

/// Identity attached to a request once its bearer token is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: ObjectId,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may mutate a record.
    pub fn can_modify(&self, owner: Option<&ObjectId>) -> bool {
        self.is_admin() || owner == Some(&self.id)
    }
}
