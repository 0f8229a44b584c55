pub mod book;
pub mod review;
pub mod user;

use mongodb::bson::oid::ObjectId;

use crate::error::AppError;

/// Parses a hex ObjectId coming from a path, query or body.
pub fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid id: {}", raw)))
}
