use axum::{
    routing::{get, post},
    Router,
};

pub mod comments;
pub mod documents;
pub mod sync;
pub mod system;
pub mod user;

/// Routes anyone may call.
pub fn public() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/comments", get(comments::list_comments))
        .route("/api/comments/:key", get(comments::list_document_comments))
        .route("/api/files", get(documents::list_files))
        .route("/api/markdown/:file", get(documents::get_markdown))
        .route("/api/render", post(documents::render))
}

/// Routes that need a resolved identity.
///
/// `/api/comments/:key` shares its path with the public listing route; the
/// method routers are merged, so only PUT and DELETE pass the gate.
pub fn protected() -> Router {
    Router::new()
        .route("/api/user", get(user::current_user))
        .route("/api/comments", post(comments::create_comment))
        .route(
            "/api/comments/:key",
            axum::routing::put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/api/sync", post(sync::sync_comments))
}
