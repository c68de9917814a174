use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use annotate_core::DomainError;
use annotate_infra::{DocumentError, StoreError, SyncError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_request", msg)
        }
        StoreError::Domain(e @ DomainError::NotFound(_)) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        other => {
            error!(error = %other, "comment storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", other.to_string())
        }
    }
}

pub fn sync_error_to_response(err: SyncError) -> axum::response::Response {
    match err {
        SyncError::NotConfigured => {
            json_error(StatusCode::BAD_REQUEST, "not_configured", err.to_string())
        }
        SyncError::InProgress => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        SyncError::InvalidRemote(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", err.to_string())
        }
        SyncError::Git { .. } | SyncError::Workdir(_) | SyncError::CorruptPull(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "sync_failed", err.to_string())
        }
    }
}

pub fn document_error_to_response(err: DocumentError) -> axum::response::Response {
    match err {
        DocumentError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        DocumentError::Io { .. } | DocumentError::Converter(_) => {
            error!(error = %err, "document access failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "document_error", err.to_string())
        }
    }
}
