//! `annotate-core`: comment domain model and mutation rules.
//!
//! This crate contains **pure domain** logic (no file, network or process I/O).
//! Persistence lives in `annotate-infra`; identity resolution in `annotate-auth`.

pub mod actor;
pub mod comment;
pub mod database;
pub mod error;
pub mod id;

pub use actor::Actor;
pub use comment::{Comment, CommentPatch, NewComment, TextRange};
pub use database::CommentDatabase;
pub use error::{DomainError, DomainResult};
pub use id::CommentId;
