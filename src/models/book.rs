use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Book document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_file: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default = "default_true")]
    pub published: bool,
    pub published_at: DateTime,
    #[serde(default)]
    pub read_count: i64,
    pub uploaded_by: Option<ObjectId>,
    pub created_at: DateTime,
}

fn default_true() -> bool {
    true
}

/// Fields a client may supply when creating a book.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_file: Option<String>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub published: Option<bool>,
}

impl Book {
    pub fn new(fields: NewBook, owner: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            title: fields.title,
            author: fields.author,
            description: fields.description,
            cover_image: fields.cover_image,
            pdf_file: fields.pdf_file,
            category: fields.category,
            available: fields.available.unwrap_or(true),
            published: fields.published.unwrap_or(true),
            published_at: now,
            read_count: 0,
            uploaded_by: Some(owner),
            created_at: now,
        }
    }

    /// Visible in public listings and readable.
    pub fn is_readable(&self) -> bool {
        self.published && self.available
    }
}

/// Whitelisted update: title, author, description, category, coverImage,
/// available, published. Nothing else on a book is client-writable.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub available: Option<bool>,
    pub published: Option<bool>,
}

impl BookChanges {
    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = Some(author);
        }
        if let Some(description) = self.description {
            book.description = Some(description);
        }
        if let Some(category) = self.category {
            book.category = Some(category);
        }
        if let Some(cover_image) = self.cover_image {
            book.cover_image = Some(cover_image);
        }
        if let Some(available) = self.available {
            book.available = available;
        }
        if let Some(published) = self.published {
            book.published = published;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookSort {
    #[default]
    Insertion,
    PublishedDesc,
}

/// Listing filter. `readable_only` keeps books that are both published and available.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub owner: Option<ObjectId>,
    pub readable_only: bool,
    pub sort: BookSort,
}

impl BookQuery {
    pub fn readable() -> Self {
        Self {
            readable_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        if self.readable_only && !book.is_readable() {
            return false;
        }
        match &self.owner {
            Some(owner) => book.uploaded_by.as_ref() == Some(owner),
            None => true,
        }
    }
}
