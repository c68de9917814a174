//! Authentication error model.

use thiserror::Error;

/// Why a request could not be authenticated. Every variant maps to 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication required: missing {0}")]
    MissingCredentials(&'static str),

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("no signing key for key id '{0}'")]
    UnknownKey(String),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),

    #[error("asserted email does not match the access token")]
    IdentityMismatch,
}

/// Startup-time misconfiguration of the authentication gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthConfigError {
    #[error("access verification is enabled but {0} is not configured")]
    Missing(&'static str),
}
