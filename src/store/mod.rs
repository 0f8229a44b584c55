//! Persistence seams. Services hold `Arc<dyn ...Store>` handles so the MongoDB
//! backend can be swapped for the in-memory one.

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{
    book::{Book, BookChanges, BookQuery},
    review::{Review, ReviewChanges, ReviewQuery},
    user::{User, UserChanges},
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constrained key.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate("email")` when the email is taken.
    async fn insert(&self, user: User) -> StoreResult<User>;
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    /// Returns the updated user, or `None` when no user has this id.
    async fn update(&self, id: &ObjectId, changes: UserChanges) -> StoreResult<Option<User>>;
    async fn delete(&self, id: &ObjectId) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: Book) -> StoreResult<Book>;
    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Book>>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Book>>;
    async fn find(&self, query: &BookQuery) -> StoreResult<Vec<Book>>;
    async fn update(&self, id: &ObjectId, changes: BookChanges) -> StoreResult<Option<Book>>;
    async fn delete(&self, id: &ObjectId) -> StoreResult<bool>;
    /// Atomically bumps `readCount` when the book is published and available.
    /// `None` means no readable book with this id exists.
    async fn increment_reads(&self, id: &ObjectId) -> StoreResult<Option<Book>>;
    async fn count(&self, query: &BookQuery) -> StoreResult<u64>;
    async fn total_reads(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `Duplicate("user_book")` when the author already reviewed the book.
    async fn insert(&self, review: Review) -> StoreResult<Review>;
    /// Newest first.
    async fn find(&self, query: &ReviewQuery) -> StoreResult<Vec<Review>>;
    /// Only touches the review when `author` wrote it.
    async fn update_by_author(
        &self,
        id: &ObjectId,
        author: &ObjectId,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>>;
    async fn delete_by_author(&self, id: &ObjectId, author: &ObjectId) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
}

/// The three store handles shared by every service.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserStore::default()),
            books: Arc::new(memory::MemoryBookStore::default()),
            reviews: Arc::new(memory::MemoryReviewStore::default()),
        }
    }

    pub fn mongo(db: &crate::services::database::Database) -> Self {
        Self {
            users: Arc::new(mongo::MongoUserStore::new(db)),
            books: Arc::new(mongo::MongoBookStore::new(db)),
            reviews: Arc::new(mongo::MongoReviewStore::new(db)),
        }
    }
}
