use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::warn;

use annotate_infra::DocumentError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_files(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.documents.list_markdown().await {
        Ok(names) => Json(names).into_response(),
        Err(e) => errors::document_error_to_response(e),
    }
}

pub async fn get_markdown(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file): Path<String>,
) -> axum::response::Response {
    match services.documents.read_markdown(&file).await {
        Ok(content) => Json(dto::MarkdownResponse { content }).into_response(),
        Err(e) => errors::document_error_to_response(e),
    }
}

pub async fn render(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RenderRequest>,
) -> axum::response::Response {
    let Some(file) = body.markdown_file.filter(|f| !f.trim().is_empty()) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", "markdownFile is required");
    };

    match services.documents.render(&file, body.bib_file.as_deref()).await {
        Ok(html) => Json(dto::RenderResponse { html, error: None }).into_response(),
        Err(e @ DocumentError::NotFound(_)) => errors::document_error_to_response(e),
        Err(e) => {
            warn!(document = %file, error = %e, "render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(dto::RenderResponse {
                    html: String::new(),
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
