use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use annotate_auth::{Credentials, IdentityResolver};

use crate::app::errors::json_error;

pub const EMAIL_HEADER: &str = "cf-access-authenticated-user-email";
pub const NAME_HEADER: &str = "cf-access-authenticated-user-name";
pub const ASSERTION_HEADER: &str = "cf-access-jwt-assertion";

#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<IdentityResolver>,
}

/// Resolve the caller's identity and attach it to the request, or answer 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let credentials = extract_credentials(req.headers());

    let identity = state.resolver.resolve(&credentials).await.map_err(|e| {
        debug!(error = %e, path = %req.uri().path(), "request rejected");
        json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string())
    })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn extract_credentials(headers: &HeaderMap) -> Credentials {
    Credentials {
        email: header_value(headers, EMAIL_HEADER),
        name: header_value(headers, NAME_HEADER),
        assertion: header_value(headers, ASSERTION_HEADER),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn blank_and_non_ascii_headers_count_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(EMAIL_HEADER, HeaderValue::from_static(" alice@example.com "));
        headers.insert(NAME_HEADER, HeaderValue::from_static("   "));
        headers.insert(ASSERTION_HEADER, HeaderValue::from_bytes(b"\xff\xfe").unwrap());

        let creds = extract_credentials(&headers);
        assert_eq!(creds.email.as_deref(), Some("alice@example.com"));
        assert_eq!(creds.name, None);
        assert_eq!(creds.assertion, None);
    }
}
