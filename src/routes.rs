use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::ServerConfig,
    handlers::{admin, auth, book, review, system, user},
    middleware::AuthMiddleware,
    ApiDoc, AppState,
};

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    match server.origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", server.origin, e);
            layer
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // Public routes - no authentication required
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/books", get(book::list_books))
        .route("/api/books/published", get(book::list_published_books))
        .route("/api/books/:id", get(book::get_book))
        .route("/api/users", get(user::list_users))
        .route("/api/users/:id", get(user::get_user))
        .route("/api/reviews", get(review::list_reviews))
        .route("/api/health", get(system::health))
        .route("/api/test-uploads", get(system::test_uploads))
        .route("/download/:filename", get(system::download));

    // Protected routes - require a valid token
    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/books", post(book::create_book))
        .route("/api/books/my-books", get(book::list_my_books))
        .route("/api/books/upload", post(book::create_book_with_file))
        .route("/api/books/upload-cover", post(book::upload_cover_image))
        .route("/api/books/:id/read", post(book::track_read))
        .route("/api/books/:id", put(book::update_book).delete(book::delete_book))
        .route("/api/users/profile", get(user::get_profile).put(user::update_profile))
        .route("/api/users/avatar", post(user::upload_avatar).delete(user::delete_avatar))
        .route("/api/reviews", post(review::add_review))
        .route("/api/reviews/:id", put(review::update_review).delete(review::delete_review))
        .route("/api/reviews/user/my-reviews", get(review::list_my_reviews))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::auth_middleware,
        ));

    // Admin routes - require a valid token and the admin role
    let admin_routes = Router::new()
        .route("/api/users/:id", put(user::update_user).delete(user::delete_user))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/users", post(admin::manage_users))
        .route_layer(axum_middleware::from_fn(AuthMiddleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::auth_middleware,
        ));

    let api_docs_routes =
        Router::new().merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(api_docs_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.server))
                .layer(DefaultBodyLimit::max(state.config.uploads.body_limit())),
        )
        .with_state(state)
}
