pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub use config::AppConfig;
pub use routes::create_router;

use services::{
    admin::AdminService, auth::AuthService, blob::BlobStore, book::BookService, review::ReviewService,
    user::UserService,
};
use store::Stores;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub books: Arc<BookService>,
    pub reviews: Arc<ReviewService>,
    pub admin: Arc<AdminService>,
    /// Upload storage, shared with the upload extractor and the download route.
    pub blobs: Arc<dyn BlobStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, stores: Stores, blobs: Arc<dyn BlobStore>) -> Self {
        let auth = Arc::new(AuthService::new(stores.users.clone(), &config.auth));
        let users = Arc::new(UserService::new(stores.users.clone(), blobs.clone(), auth.clone()));

        Self {
            books: Arc::new(BookService::new(
                stores.books.clone(),
                stores.users.clone(),
                blobs.clone(),
            )),
            reviews: Arc::new(ReviewService::new(
                stores.reviews.clone(),
                stores.users.clone(),
                stores.books.clone(),
            )),
            admin: Arc::new(AdminService::new(stores, users.clone())),
            users,
            auth,
            blobs,
            config,
        }
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::profile,
        handlers::book::list_books,
        handlers::book::list_published_books,
        handlers::book::list_my_books,
        handlers::book::get_book,
        handlers::book::create_book,
        handlers::book::create_book_with_file,
        handlers::book::upload_cover_image,
        handlers::book::track_read,
        handlers::book::update_book,
        handlers::book::delete_book,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::upload_avatar,
        handlers::user::delete_avatar,
        handlers::review::list_reviews,
        handlers::review::add_review,
        handlers::review::update_review,
        handlers::review::delete_review,
        handlers::review::list_my_reviews,
        handlers::admin::dashboard,
        handlers::admin::manage_users,
        handlers::system::health,
        handlers::system::test_uploads,
        handlers::system::download,
    ),
    components(schemas(
        dto::ErrorResponse,
        dto::MessageResponse,
        dto::auth::RegisterRequest,
        dto::auth::LoginRequest,
        dto::auth::RegisterResponse,
        dto::auth::LoginResponse,
        dto::user::UserResponse,
        dto::user::UserSummary,
        dto::user::UpdateProfileRequest,
        dto::user::UpdateUserRequest,
        dto::user::UserEnvelope,
        dto::user::AvatarResponse,
        dto::book::CreateBookRequest,
        dto::book::UpdateBookRequest,
        dto::book::BookResponse,
        dto::book::ReadBookInfo,
        dto::book::ReadTrackResponse,
        dto::book::CoverUploadResponse,
        dto::review::CreateReviewRequest,
        dto::review::UpdateReviewRequest,
        dto::review::ReviewBook,
        dto::review::ReviewResponse,
        dto::review::ReviewEnvelope,
        dto::admin::DashboardStats,
        dto::admin::UserAction,
        dto::admin::ManageUserRequest,
        dto::admin::ManageUserResponse,
        dto::system::HealthResponse,
        dto::system::StoredFileInfo,
        dto::system::UploadsListing,
        models::user::Role,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "books", description = "Book catalogue and uploads"),
        (name = "users", description = "User accounts and avatars"),
        (name = "reviews", description = "Book reviews"),
        (name = "admin", description = "Administration"),
        (name = "system", description = "Health and file access")
    )
)]
pub struct ApiDoc;
