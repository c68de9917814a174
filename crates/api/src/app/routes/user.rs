use axum::{extract::Extension, Json};

use annotate_auth::Identity;

/// The identity the gate resolved for this request.
pub async fn current_user(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}
