//! In-process stores backed by `RwLock<Vec<_>>`. Used by the `memory`
//! database backend and by the test suite.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{BookStore, ReviewStore, StoreError, StoreResult, UserStore};
use crate::models::{
    book::{Book, BookChanges, BookQuery, BookSort},
    review::{Review, ReviewChanges, ReviewQuery},
    user::{User, UserChanges},
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, mut user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.id.map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn update(&self, id: &ObjectId, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| &u.email == email && u.id.as_ref() != Some(id)) {
                return Err(StoreError::Duplicate("email".to_string()));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id.as_ref() == Some(id)) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id.as_ref() != Some(id));
        Ok(users.len() != before)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, mut book: Book) -> StoreResult<Book> {
        book.id = Some(ObjectId::new());
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id.as_ref() == Some(id)).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|b| b.id.map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn find(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        let books = self.books.read().await;
        let mut found: Vec<Book> = books.iter().filter(|b| query.matches(b)).cloned().collect();
        if query.sort == BookSort::PublishedDesc {
            // later inserts win ties on the millisecond timestamp
            found.reverse();
            found.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        }
        Ok(found)
    }

    async fn update(&self, id: &ObjectId, changes: BookChanges) -> StoreResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|b| b.id.as_ref() == Some(id)) else {
            return Ok(None);
        };
        changes.apply(book);
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id.as_ref() != Some(id));
        Ok(books.len() != before)
    }

    async fn increment_reads(&self, id: &ObjectId) -> StoreResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books
            .iter_mut()
            .find(|b| b.id.as_ref() == Some(id) && b.is_readable())
        else {
            return Ok(None);
        };
        book.read_count += 1;
        Ok(Some(book.clone()))
    }

    async fn count(&self, query: &BookQuery) -> StoreResult<u64> {
        let books = self.books.read().await;
        Ok(books.iter().filter(|b| query.matches(b)).count() as u64)
    }

    async fn total_reads(&self) -> StoreResult<i64> {
        let books = self.books.read().await;
        Ok(books.iter().map(|b| b.read_count).sum())
    }
}

#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<Vec<Review>>,
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, mut review: Review) -> StoreResult<Review> {
        let mut reviews = self.reviews.write().await;
        if reviews
            .iter()
            .any(|r| r.user == review.user && r.book == review.book)
        {
            return Err(StoreError::Duplicate("user_book".to_string()));
        }
        review.id = Some(ObjectId::new());
        reviews.push(review.clone());
        Ok(review)
    }

    async fn find(&self, query: &ReviewQuery) -> StoreResult<Vec<Review>> {
        let reviews = self.reviews.read().await;
        // newest first; later inserts win ties
        let mut found: Vec<Review> = reviews
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_by_author(
        &self,
        id: &ObjectId,
        author: &ObjectId,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>> {
        let mut reviews = self.reviews.write().await;
        let Some(review) = reviews
            .iter_mut()
            .find(|r| r.id.as_ref() == Some(id) && &r.user == author)
        else {
            return Ok(None);
        };
        changes.apply(review);
        Ok(Some(review.clone()))
    }

    async fn delete_by_author(&self, id: &ObjectId, author: &ObjectId) -> StoreResult<bool> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| !(r.id.as_ref() == Some(id) && &r.user == author));
        Ok(reviews.len() != before)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.reviews.read().await.len() as u64)
    }
}
