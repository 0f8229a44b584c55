use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{hex_id, timestamp, user::UserSummary};
use crate::models::{book::Book, review::Review};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Hex id of the reviewed book
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub book_id: Option<String>,
}

/// Book side of a review. Title/author/cover are present only where the book is expanded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBook {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl ReviewBook {
    pub fn id_only(id: String) -> Self {
        Self {
            id,
            title: None,
            author: None,
            cover_image: None,
        }
    }
}

impl From<&Book> for ReviewBook {
    fn from(book: &Book) -> Self {
        Self {
            id: hex_id(book.id),
            title: Some(book.title.clone()),
            author: book.author.clone(),
            cover_image: book.cover_image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub book: ReviewBook,
    pub user: UserSummary,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl ReviewResponse {
    pub fn new(review: Review, book: ReviewBook, user: UserSummary) -> Self {
        Self {
            id: hex_id(review.id),
            book,
            user,
            rating: review.rating,
            comment: review.comment,
            created_at: timestamp(review.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewEnvelope {
    pub message: String,
    pub review: ReviewResponse,
}
