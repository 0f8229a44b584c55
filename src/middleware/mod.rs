pub mod auth;
pub mod json;
pub mod upload;

pub use auth::AuthMiddleware;
