use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    dto::{
        review::{ReviewBook, ReviewResponse},
        user::UserSummary,
    },
    error::{AppError, AppResult},
    models::{
        book::Book,
        review::{Review, ReviewChanges, ReviewQuery},
        user::{AuthUser, User},
    },
    store::{BookStore, ReviewStore, StoreError, UserStore},
};

const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 5;

fn not_found() -> AppError {
    AppError::NotFound("Review not found".to_string())
}

fn check_rating(rating: i32) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::BadRequest(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

fn unique<T, K: std::hash::Hash + Eq>(items: &[T], key: impl Fn(&T) -> K) -> Vec<K> {
    items.iter().map(key).collect::<HashSet<_>>().into_iter().collect()
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    users: Arc<dyn UserStore>,
    books: Arc<dyn BookStore>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>, users: Arc<dyn UserStore>, books: Arc<dyn BookStore>) -> Self {
        Self { reviews, users, books }
    }

    /// Expands authors always and books when `with_books` is set.
    async fn expand(&self, reviews: Vec<Review>, with_books: bool) -> AppResult<Vec<ReviewResponse>> {
        let authors: HashMap<ObjectId, User> = self
            .users
            .find_by_ids(&unique(&reviews, |r| r.user))
            .await?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();

        let books: HashMap<ObjectId, Book> = if with_books {
            self.books
                .find_by_ids(&unique(&reviews, |r| r.book))
                .await?
                .into_iter()
                .filter_map(|b| b.id.map(|id| (id, b)))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(reviews
            .into_iter()
            .map(|review| {
                let user = match authors.get(&review.user) {
                    Some(author) => UserSummary::author(author),
                    None => UserSummary::id_only(review.user.to_hex()),
                };
                let book = match books.get(&review.book) {
                    Some(book) => ReviewBook::from(book),
                    None => ReviewBook::id_only(review.book.to_hex()),
                };
                ReviewResponse::new(review, book, user)
            })
            .collect())
    }

    async fn expand_one(&self, review: Review) -> AppResult<ReviewResponse> {
        self.expand(vec![review], false)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("expansion dropped a review")))
    }

    /// One review per (user, book); the store enforces it.
    pub async fn add(
        &self,
        book: ObjectId,
        rating: i32,
        comment: Option<String>,
        caller: &AuthUser,
    ) -> AppResult<ReviewResponse> {
        check_rating(rating)?;

        let review = self
            .reviews
            .insert(Review::new(book, caller.id, rating, comment))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    AppError::Conflict("You have already reviewed this book".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!("Review added for book {} by {}", book, caller.id);
        self.expand_one(review).await
    }

    pub async fn list(&self, book: Option<ObjectId>) -> AppResult<Vec<ReviewResponse>> {
        let reviews = self.reviews.find(&ReviewQuery { book, user: None }).await?;
        self.expand(reviews, false).await
    }

    pub async fn list_own(&self, caller: &AuthUser) -> AppResult<Vec<ReviewResponse>> {
        let query = ReviewQuery {
            book: None,
            user: Some(caller.id),
        };
        let reviews = self.reviews.find(&query).await?;
        self.expand(reviews, true).await
    }

    /// Someone else's review reports as not found.
    pub async fn update(&self, id: &ObjectId, changes: ReviewChanges, caller: &AuthUser) -> AppResult<ReviewResponse> {
        if let Some(rating) = changes.rating {
            check_rating(rating)?;
        }
        let review = self
            .reviews
            .update_by_author(id, &caller.id, changes)
            .await?
            .ok_or_else(not_found)?;
        self.expand_one(review).await
    }

    pub async fn delete(&self, id: &ObjectId, caller: &AuthUser) -> AppResult<()> {
        if !self.reviews.delete_by_author(id, &caller.id).await? {
            return Err(not_found());
        }
        tracing::info!("Review {} deleted by {}", id, caller.id);
        Ok(())
    }
}
