use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Headroom over the configured file size for multipart framing and
    // the other form fields.
    let body_limit = state.config.upload.max_file_size + 1024 * 1024;
    let uploads_dir = state.config.upload.dir.clone();

    Router::new()
        .route("/notes/process", post(handlers::upload::process_image))
        .route("/notes/ocr-only", post(handlers::upload::ocr_only))
        .route("/notes/recent", get(handlers::notes::recent))
        .route("/notes/history", get(handlers::notes::history))
        .route("/notes/search", get(handlers::notes::search))
        .route(
            "/notes/{id}",
            get(handlers::notes::get_note).delete(handlers::notes::delete_note),
        )
        .route(
            "/notes/{id}/tags",
            post(handlers::notes::add_tags).delete(handlers::notes::remove_tags),
        )
        .route("/upload/image", post(handlers::upload::upload_image))
        .route("/health", get(handlers::health::health))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
