//! `annotate-auth`: request authentication boundary.
//!
//! Turns the credential material a request carries into a verified
//! [`Identity`]. This crate is intentionally decoupled from HTTP frameworks:
//! the API layer extracts [`Credentials`] from headers and hands them over.

pub mod claims;
pub mod error;
pub mod identity;
pub mod keys;
pub mod resolver;
pub mod settings;

pub use claims::{AccessClaims, AccessTokenVerifier};
pub use error::{AuthConfigError, AuthError};
pub use identity::Identity;
pub use keys::{HttpKeySource, KeyCache, KeyCachePolicy, KeySource};
pub use resolver::{Credentials, IdentityResolver};
pub use settings::AuthSettings;
