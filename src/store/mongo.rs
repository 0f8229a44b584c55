use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection,
};

use super::{BookStore, ReviewStore, StoreError, StoreResult, UserStore};
use crate::{
    models::{
        book::{Book, BookChanges, BookQuery, BookSort},
        review::{Review, ReviewChanges, ReviewQuery},
        user::{User, UserChanges},
    },
    services::database::{Database, BOOKS, REVIEWS, USERS},
};

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Maps a driver error, recognising unique index violations on `key`.
fn unique_violation(key: &str) -> impl Fn(mongodb::error::Error) -> StoreError + '_ {
    move |err| {
        if is_duplicate_key(&err) {
            StoreError::Duplicate(key.to_string())
        } else {
            StoreError::Backend(err.into())
        }
    }
}

fn backend(err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(err.into())
}

fn after_update() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn inserted_id(result: &mongodb::results::InsertOneResult) -> StoreResult<ObjectId> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("inserted id is not an ObjectId")))
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.database.collection(USERS),
        }
    }
}

fn user_set(changes: UserChanges) -> Document {
    let mut set = Document::new();
    if let Some(name) = changes.name {
        set.insert("name", name);
    }
    if let Some(email) = changes.email {
        set.insert("email", email);
    }
    if let Some(password) = changes.password {
        set.insert("password", password);
    }
    if let Some(avatar) = changes.avatar {
        set.insert("avatar", avatar);
    }
    if let Some(role) = changes.role {
        set.insert("role", role.as_str());
    }
    set
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, mut user: User) -> StoreResult<User> {
        let result = self
            .collection
            .insert_one(&user, None)
            .await
            .map_err(unique_violation("email"))?;
        user.id = Some(inserted_id(&result)?);
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        self.collection
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(backend)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.collection
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(backend)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let cursor = self.collection.find(None, None).await.map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn update(&self, id: &ObjectId, changes: UserChanges) -> StoreResult<Option<User>> {
        let set = user_set(changes);
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        self.collection
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set }, after_update())
            .await
            .map_err(unique_violation("email"))
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": *id }, None)
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.collection.count_documents(None, None).await.map_err(backend)
    }
}

pub struct MongoBookStore {
    collection: Collection<Book>,
}

impl MongoBookStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.database.collection(BOOKS),
        }
    }
}

fn book_filter(query: &BookQuery) -> Document {
    let mut filter = Document::new();
    if query.readable_only {
        filter.insert("published", true);
        filter.insert("available", true);
    }
    if let Some(owner) = query.owner {
        filter.insert("uploadedBy", owner);
    }
    filter
}

fn book_set(changes: BookChanges) -> Document {
    let mut set = Document::new();
    if let Some(title) = changes.title {
        set.insert("title", title);
    }
    if let Some(author) = changes.author {
        set.insert("author", author);
    }
    if let Some(description) = changes.description {
        set.insert("description", description);
    }
    if let Some(category) = changes.category {
        set.insert("category", category);
    }
    if let Some(cover_image) = changes.cover_image {
        set.insert("coverImage", cover_image);
    }
    if let Some(available) = changes.available {
        set.insert("available", available);
    }
    if let Some(published) = changes.published {
        set.insert("published", published);
    }
    set
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, mut book: Book) -> StoreResult<Book> {
        let result = self.collection.insert_one(&book, None).await.map_err(backend)?;
        book.id = Some(inserted_id(&result)?);
        Ok(book)
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Book>> {
        self.collection
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(backend)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Book>> {
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn find(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        let options = match query.sort {
            BookSort::Insertion => None,
            BookSort::PublishedDesc => Some(
                FindOptions::builder()
                    .sort(doc! { "publishedAt": -1, "_id": -1 })
                    .build(),
            ),
        };
        let cursor = self
            .collection
            .find(book_filter(query), options)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn update(&self, id: &ObjectId, changes: BookChanges) -> StoreResult<Option<Book>> {
        let set = book_set(changes);
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        self.collection
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set }, after_update())
            .await
            .map_err(backend)
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": *id }, None)
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn increment_reads(&self, id: &ObjectId) -> StoreResult<Option<Book>> {
        self.collection
            .find_one_and_update(
                doc! { "_id": *id, "published": true, "available": true },
                doc! { "$inc": { "readCount": 1_i64 } },
                after_update(),
            )
            .await
            .map_err(backend)
    }

    async fn count(&self, query: &BookQuery) -> StoreResult<u64> {
        self.collection
            .count_documents(book_filter(query), None)
            .await
            .map_err(backend)
    }

    async fn total_reads(&self) -> StoreResult<i64> {
        let pipeline = vec![doc! {
            "$group": { "_id": Bson::Null, "total": { "$sum": "$readCount" } }
        }];
        let mut cursor = self.collection.aggregate(pipeline, None).await.map_err(backend)?;
        let total = match cursor.try_next().await.map_err(backend)? {
            Some(row) => match row.get("total") {
                Some(Bson::Int64(n)) => *n,
                Some(Bson::Int32(n)) => i64::from(*n),
                Some(Bson::Double(n)) => *n as i64,
                _ => 0,
            },
            None => 0,
        };
        Ok(total)
    }
}

pub struct MongoReviewStore {
    collection: Collection<Review>,
}

impl MongoReviewStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.database.collection(REVIEWS),
        }
    }
}

fn review_filter(query: &ReviewQuery) -> Document {
    let mut filter = Document::new();
    if let Some(book) = query.book {
        filter.insert("book", book);
    }
    if let Some(user) = query.user {
        filter.insert("user", user);
    }
    filter
}

#[async_trait]
impl ReviewStore for MongoReviewStore {
    async fn insert(&self, mut review: Review) -> StoreResult<Review> {
        let result = self
            .collection
            .insert_one(&review, None)
            .await
            .map_err(unique_violation("user_book"))?;
        review.id = Some(inserted_id(&result)?);
        Ok(review)
    }

    async fn find(&self, query: &ReviewQuery) -> StoreResult<Vec<Review>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        let cursor = self
            .collection
            .find(review_filter(query), options)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn update_by_author(
        &self,
        id: &ObjectId,
        author: &ObjectId,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>> {
        let mut set = Document::new();
        if let Some(rating) = changes.rating {
            set.insert("rating", rating);
        }
        if let Some(comment) = changes.comment {
            set.insert("comment", comment);
        }
        let filter = doc! { "_id": *id, "user": *author };
        if set.is_empty() {
            return self.collection.find_one(filter, None).await.map_err(backend);
        }
        self.collection
            .find_one_and_update(filter, doc! { "$set": set }, after_update())
            .await
            .map_err(backend)
    }

    async fn delete_by_author(&self, id: &ObjectId, author: &ObjectId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": *id, "user": *author }, None)
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.collection.count_documents(None, None).await.map_err(backend)
    }
}
