use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use annotate_auth::Identity;
use annotate_core::CommentId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_comments(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.comments.list(None).await).into_response()
}

/// Comments whose `documentRef` equals the path segment, in insertion order.
pub async fn list_document_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(document): Path<String>,
) -> axum::response::Response {
    Json(services.comments.list(Some(&document)).await).into_response()
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<dto::CreateCommentRequest>,
) -> axum::response::Response {
    match services.comments.create(body.into(), &identity.actor()).await {
        Ok(comment) => {
            info!(comment_id = %comment.id, author = %identity.email, "comment created");
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCommentRequest>,
) -> axum::response::Response {
    let id = CommentId::from(id);
    match services.comments.update(&id, body.into(), &identity.actor()).await {
        Ok(comment) => (StatusCode::OK, Json(comment)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Replies to the removed comment are kept; their `inReplyTo` dangles.
pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = CommentId::from(id);
    match services.comments.delete(&id).await {
        Ok(_) => {
            info!(comment_id = %id, actor = %identity.email, "comment deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
