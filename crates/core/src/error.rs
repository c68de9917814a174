//! Domain error model.

use thiserror::Error;

use crate::CommentId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only deterministic, request-level failures belong here. Storage and
/// process failures are modelled by the infrastructure crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No comment with this id exists.
    #[error("comment not found: {0}")]
    NotFound(CommentId),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(id: &CommentId) -> Self {
        Self::NotFound(id.clone())
    }
}
