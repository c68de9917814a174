use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use annotate_auth::Identity;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Commit and push the comment database. 409 while another sync runs.
pub async fn sync_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> axum::response::Response {
    match services.sync.sync(&identity.actor(), Utc::now()).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(dto::SyncResponse {
                success: true,
                message: outcome.message,
                synced: outcome.synced,
                branch: outcome.branch,
            }),
        )
            .into_response(),
        Err(e) => errors::sync_error_to_response(e),
    }
}
