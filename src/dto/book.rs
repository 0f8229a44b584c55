use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{hex_id, timestamp, user::UserSummary};
use crate::models::book::{Book, BookChanges, NewBook};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_file: Option<String>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub published: Option<bool>,
}

impl From<CreateBookRequest> for NewBook {
    fn from(req: CreateBookRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            description: req.description,
            cover_image: req.cover_image,
            pdf_file: req.pdf_file,
            category: req.category,
            available: req.available,
            published: req.published,
        }
    }
}

/// Only these fields of a book can be edited; anything else in the body is ignored.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub available: Option<bool>,
    pub published: Option<bool>,
}

impl From<UpdateBookRequest> for BookChanges {
    fn from(req: UpdateBookRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            description: req.description,
            category: req.category,
            cover_image: req.cover_image,
            available: req.available,
            published: req.published,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_file: Option<String>,
    pub category: Option<String>,
    pub available: bool,
    pub published: bool,
    pub published_at: String,
    pub read_count: i64,
    pub uploaded_by: Option<UserSummary>,
    pub created_at: String,
}

impl BookResponse {
    pub fn new(book: Book, uploaded_by: Option<UserSummary>) -> Self {
        Self {
            id: hex_id(book.id),
            title: book.title,
            author: book.author,
            description: book.description,
            cover_image: book.cover_image,
            pdf_file: book.pdf_file,
            category: book.category,
            available: book.available,
            published: book.published,
            published_at: timestamp(book.published_at),
            read_count: book.read_count,
            uploaded_by,
            created_at: timestamp(book.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadBookInfo {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub pdf_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadTrackResponse {
    pub message: String,
    pub read_count: i64,
    pub book: ReadBookInfo,
}

impl From<Book> for ReadTrackResponse {
    fn from(book: Book) -> Self {
        Self {
            message: "Book read tracked successfully".to_string(),
            read_count: book.read_count,
            book: ReadBookInfo {
                id: hex_id(book.id),
                title: book.title,
                author: book.author,
                pdf_file: book.pdf_file,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverUploadResponse {
    pub message: String,
    pub image_url: String,
    pub full_url: String,
}
