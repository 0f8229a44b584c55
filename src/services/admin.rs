use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    dto::admin::{DashboardStats, UserAction},
    error::{AppError, AppResult},
    models::{
        book::BookQuery,
        user::{AuthUser, Role, User, UserChanges},
    },
    services::user::UserService,
    store::Stores,
};

pub struct AdminService {
    stores: Stores,
    users: Arc<UserService>,
}

impl AdminService {
    pub fn new(stores: Stores, users: Arc<UserService>) -> Self {
        Self { stores, users }
    }

    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        Ok(DashboardStats {
            total_users: self.stores.users.count().await?,
            total_books: self.stores.books.count(&BookQuery::default()).await?,
            published_books: self.stores.books.count(&BookQuery::readable()).await?,
            total_reviews: self.stores.reviews.count().await?,
            total_reads: self.stores.books.total_reads().await?,
        })
    }

    /// Promote, demote or delete another account. Returns the updated user,
    /// or `None` after a delete.
    pub async fn manage_user(
        &self,
        action: UserAction,
        target: &ObjectId,
        admin: &AuthUser,
    ) -> AppResult<Option<User>> {
        if target == &admin.id {
            return Err(AppError::BadRequest("Cannot change your own account".to_string()));
        }

        let not_found = || AppError::NotFound("User not found".to_string());
        let role = match action {
            UserAction::Promote => Role::Admin,
            UserAction::Demote => Role::User,
            UserAction::Delete => {
                self.users.delete_user(target).await?;
                tracing::info!("Admin {} deleted user {}", admin.id, target);
                return Ok(None);
            }
        };

        let changes = UserChanges {
            role: Some(role),
            ..UserChanges::default()
        };
        let user = self
            .stores
            .users
            .update(target, changes)
            .await?
            .ok_or_else(not_found)?;
        tracing::info!("Admin {} set role of {} to {}", admin.id, target, role.as_str());
        Ok(Some(user))
    }
}
