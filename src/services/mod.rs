pub mod admin;
pub mod auth;
pub mod blob;
pub mod book;
pub mod database;
pub mod review;
pub mod user;
