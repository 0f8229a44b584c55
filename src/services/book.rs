use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    dto::{
        book::{BookResponse, ReadTrackResponse},
        user::UserSummary,
    },
    error::{AppError, AppResult},
    middleware::upload::StoredFile,
    models::{
        book::{Book, BookChanges, BookQuery, BookSort, NewBook},
        user::{AuthUser, User},
    },
    services::blob::BlobStore,
    store::{BookStore, UserStore},
};

fn not_found() -> AppError {
    AppError::NotFound("Book not found".to_string())
}

pub struct BookService {
    books: Arc<dyn BookStore>,
    users: Arc<dyn UserStore>,
    blobs: Arc<dyn BlobStore>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookStore>, users: Arc<dyn UserStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { books, users, blobs }
    }

    /// Loads the owners of `books` in one store round trip.
    async fn owners(&self, books: &[Book]) -> AppResult<HashMap<ObjectId, User>> {
        let ids: HashSet<ObjectId> = books.iter().filter_map(|b| b.uploaded_by).collect();
        let ids: Vec<ObjectId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.find_by_ids(&ids).await?;
        Ok(users
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect())
    }

    async fn expand_all(&self, books: Vec<Book>) -> AppResult<Vec<BookResponse>> {
        let owners = self.owners(&books).await?;
        Ok(books
            .into_iter()
            .map(|book| {
                let owner = book.uploaded_by.map(|id| match owners.get(&id) {
                    Some(user) => UserSummary::owner(user),
                    None => UserSummary::id_only(id.to_hex()),
                });
                BookResponse::new(book, owner)
            })
            .collect())
    }

    async fn expand(&self, book: Book) -> AppResult<BookResponse> {
        let mut expanded = self.expand_all(vec![book]).await?;
        expanded
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("expansion dropped a book")))
    }

    pub async fn create(&self, fields: NewBook, owner: &AuthUser) -> AppResult<BookResponse> {
        if fields.title.trim().is_empty() {
            return Err(AppError::Validation("Book validation failed: title is required".to_string()));
        }
        let book = self.books.insert(Book::new(fields, owner.id)).await?;
        tracing::info!("Book created: {} by {}", book.title, owner.id);
        self.expand(book).await
    }

    /// Creates a book whose `pdfFile` points at an already stored upload.
    pub async fn create_with_file(
        &self,
        mut fields: NewBook,
        file: Option<StoredFile>,
        owner: &AuthUser,
    ) -> AppResult<BookResponse> {
        let Some(file) = file else {
            return Err(AppError::BadRequest("PDF file is required".to_string()));
        };
        fields.pdf_file = Some(file.public_path.clone());

        match self.create(fields, owner).await {
            Ok(book) => {
                tracing::info!("Book {} created from {} ({} bytes)", book.id, file.original_name, file.size);
                Ok(book)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&file.key).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", file.key, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn list_public(&self) -> AppResult<Vec<BookResponse>> {
        let books = self.books.find(&BookQuery::readable()).await?;
        self.expand_all(books).await
    }

    /// Public books, most recently published first.
    pub async fn list_published(&self) -> AppResult<Vec<BookResponse>> {
        let query = BookQuery {
            sort: BookSort::PublishedDesc,
            ..BookQuery::readable()
        };
        let books = self.books.find(&query).await?;
        self.expand_all(books).await
    }

    /// Everything the caller uploaded, whatever its flags.
    pub async fn list_own(&self, owner: &AuthUser) -> AppResult<Vec<BookResponse>> {
        let query = BookQuery {
            owner: Some(owner.id),
            ..BookQuery::default()
        };
        let books = self.books.find(&query).await?;
        self.expand_all(books).await
    }

    /// Direct lookup, not restricted to published/available books.
    pub async fn get(&self, id: &ObjectId) -> AppResult<BookResponse> {
        let book = self.books.find_by_id(id).await?.ok_or_else(not_found)?;
        self.expand(book).await
    }

    pub async fn update(&self, id: &ObjectId, changes: BookChanges, requester: &AuthUser) -> AppResult<BookResponse> {
        let existing = self.books.find_by_id(id).await?.ok_or_else(not_found)?;
        if !requester.can_modify(existing.uploaded_by.as_ref()) {
            return Err(AppError::Forbidden("You can only edit your own books".to_string()));
        }
        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("Book validation failed: title is required".to_string()));
        }

        let book = self.books.update(id, changes).await?.ok_or_else(not_found)?;
        tracing::info!("Book {} updated by {}", id, requester.id);
        self.expand(book).await
    }

    pub async fn delete(&self, id: &ObjectId, requester: &AuthUser) -> AppResult<()> {
        let existing = self.books.find_by_id(id).await?.ok_or_else(not_found)?;
        if !requester.can_modify(existing.uploaded_by.as_ref()) {
            return Err(AppError::Forbidden("You can only delete your own books".to_string()));
        }
        if !self.books.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!("Book {} deleted by {}", id, requester.id);
        Ok(())
    }

    pub async fn track_read(&self, id: &ObjectId) -> AppResult<ReadTrackResponse> {
        if let Some(book) = self.books.increment_reads(id).await? {
            return Ok(book.into());
        }
        // no readable match: tell missing apart from hidden
        match self.books.find_by_id(id).await? {
            None => Err(not_found()),
            Some(_) => Err(AppError::Forbidden("Book is not available for reading".to_string())),
        }
    }
}
