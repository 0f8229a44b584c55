use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    dto::user::{UpdateProfileRequest, UpdateUserRequest},
    error::{AppError, AppResult},
    middleware::upload::StoredFile,
    models::user::{AuthUser, User, UserChanges, DEFAULT_AVATAR},
    services::{auth::AuthService, blob::BlobStore},
    store::{StoreError, UserStore},
};

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

fn duplicate_email(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => AppError::Validation("Email already in use".to_string()),
        other => other.into(),
    }
}

/// Rejects explicitly blank name/email, the way a required schema field would.
fn validate(changes: &UserChanges) -> AppResult<()> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("User validation failed: name is required".to_string()));
    }
    if changes.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
        return Err(AppError::Validation("User validation failed: email is required".to_string()));
    }
    Ok(())
}

pub struct UserService {
    users: Arc<dyn UserStore>,
    blobs: Arc<dyn BlobStore>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, blobs: Arc<dyn BlobStore>, auth: Arc<AuthService>) -> Self {
        Self { users, blobs, auth }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.list().await?)
    }

    pub async fn get(&self, id: &ObjectId) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Admin edit of any field; a new password is re-hashed.
    pub async fn update_user(&self, id: &ObjectId, request: UpdateUserRequest) -> AppResult<User> {
        let password = match request.password {
            Some(password) if password.is_empty() => {
                return Err(AppError::Validation("User validation failed: password is required".to_string()))
            }
            Some(password) => Some(self.auth.hash_password(&password).await?),
            None => None,
        };
        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.map(|e| e.trim().to_string()),
            password,
            avatar: request.avatar,
            role: request.role,
        };
        validate(&changes)?;

        let user = self
            .users
            .update(id, changes)
            .await
            .map_err(duplicate_email)?
            .ok_or_else(not_found)?;
        tracing::info!("User {} updated", id);
        Ok(user)
    }

    /// Removes the account and its locally stored avatar.
    pub async fn delete_user(&self, id: &ObjectId) -> AppResult<()> {
        let user = self.users.find_by_id(id).await?.ok_or_else(not_found)?;
        if !self.users.delete(id).await? {
            return Err(not_found());
        }
        if let Some(key) = user.local_avatar_key() {
            self.discard(&key).await;
        }
        tracing::info!("User {} deleted", id);
        Ok(())
    }

    /// Self-service update restricted to name and email.
    pub async fn update_profile(&self, caller: &AuthUser, request: UpdateProfileRequest) -> AppResult<User> {
        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.map(|e| e.trim().to_string()),
            ..UserChanges::default()
        };
        validate(&changes)?;

        self.users
            .update(&caller.id, changes)
            .await
            .map_err(duplicate_email)?
            .ok_or_else(not_found)
    }

    /// Points the caller's avatar at a freshly stored file, then removes the
    /// previous locally stored avatar.
    pub async fn upload_avatar(&self, caller: &AuthUser, stored: StoredFile) -> AppResult<(User, String)> {
        let previous = match self.users.find_by_id(&caller.id).await? {
            Some(user) => user,
            None => {
                self.discard(&stored.key).await;
                return Err(not_found());
            }
        };

        let changes = UserChanges {
            avatar: Some(stored.public_path.clone()),
            ..UserChanges::default()
        };
        let user = match self.users.update(&caller.id, changes).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.discard(&stored.key).await;
                return Err(not_found());
            }
            Err(e) => {
                self.discard(&stored.key).await;
                return Err(e.into());
            }
        };

        if let Some(old_key) = previous.local_avatar_key() {
            if old_key != stored.key {
                self.discard(&old_key).await;
            }
        }

        Ok((user, stored.public_path))
    }

    /// Resets the avatar to the placeholder. Idempotent; a placeholder avatar
    /// triggers no blob deletion.
    pub async fn delete_avatar(&self, caller: &AuthUser) -> AppResult<User> {
        let user = self.users.find_by_id(&caller.id).await?.ok_or_else(not_found)?;

        if let Some(key) = user.local_avatar_key() {
            self.discard(&key).await;
        }

        let changes = UserChanges {
            avatar: Some(DEFAULT_AVATAR.to_string()),
            ..UserChanges::default()
        };
        self.users.update(&caller.id, changes).await?.ok_or_else(not_found)
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            tracing::warn!("Failed to remove {}: {}", key, e);
        }
    }
}
