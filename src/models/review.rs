use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Review document. (user, book) is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub book: ObjectId,
    pub user: ObjectId,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime,
}

impl Review {
    pub fn new(book: ObjectId, user: ObjectId, rating: i32, comment: Option<String>) -> Self {
        Self {
            id: None,
            book,
            user,
            rating,
            comment,
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewChanges {
    pub fn apply(self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = self.comment {
            review.comment = Some(comment);
        }
    }
}

/// Reviews are always listed newest first.
#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub book: Option<ObjectId>,
    pub user: Option<ObjectId>,
}

impl ReviewQuery {
    pub fn matches(&self, review: &Review) -> bool {
        self.book.map_or(true, |book| review.book == book)
            && self.user.map_or(true, |user| review.user == user)
    }
}
