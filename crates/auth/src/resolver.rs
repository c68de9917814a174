//! Request credentials → identity.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    AccessTokenVerifier, AuthConfigError, AuthError, AuthSettings, HttpKeySource, Identity,
    KeyCachePolicy, KeySource,
};

/// Credential material carried by one request.
///
/// The asserted email and name are informational only; the signed assertion
/// is what gets checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: Option<String>,
    pub name: Option<String>,
    pub assertion: Option<String>,
}

enum Mode {
    Development(Identity),
    Verified(AccessTokenVerifier),
}

/// Resolves [`Credentials`] into an [`Identity`] or rejects them.
pub struct IdentityResolver {
    mode: Mode,
}

impl IdentityResolver {
    /// Build the resolver for the configured mode, fetching keys from the
    /// trust domain over HTTPS when verification is on.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AuthConfigError> {
        let team_domain = settings.team_domain.as_deref().unwrap_or_default();
        Self::with_key_source(settings, Arc::new(HttpKeySource::for_team_domain(team_domain)))
    }

    /// Like [`IdentityResolver::from_settings`] with an explicit key source.
    ///
    /// Fails when verification is required but the trust domain or audience is
    /// missing: the gate must never come up half-configured.
    pub fn with_key_source(
        settings: &AuthSettings,
        source: Arc<dyn KeySource>,
    ) -> Result<Self, AuthConfigError> {
        if !settings.requires_verification() {
            warn!(
                email = %settings.dev_email,
                "access verification disabled; every request acts as the development user"
            );
            return Ok(Self::development(Identity::development(
                &settings.dev_email,
                &settings.dev_name,
            )));
        }

        let team_domain = non_empty(settings.team_domain.as_deref())
            .ok_or(AuthConfigError::Missing("trust domain"))?;
        let audience =
            non_empty(settings.audience.as_deref()).ok_or(AuthConfigError::Missing("audience"))?;

        Ok(Self {
            mode: Mode::Verified(AccessTokenVerifier::new(
                source,
                KeyCachePolicy::default(),
                team_domain,
                audience,
            )),
        })
    }

    pub fn development(identity: Identity) -> Self {
        Self {
            mode: Mode::Development(identity),
        }
    }

    pub fn verifies_tokens(&self) -> bool {
        matches!(self.mode, Mode::Verified(_))
    }

    pub async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let verifier = match &self.mode {
            Mode::Development(identity) => return Ok(identity.clone()),
            Mode::Verified(verifier) => verifier,
        };

        let email = non_empty(credentials.email.as_deref())
            .ok_or(AuthError::MissingCredentials("authenticated user email"))?;
        let assertion = non_empty(credentials.assertion.as_deref())
            .ok_or(AuthError::MissingCredentials("access assertion"))?;

        let claims = verifier.verify(assertion).await.inspect_err(|e| {
            debug!(error = %e, "access assertion rejected");
        })?;

        if let Some(token_email) = claims.email.as_deref() {
            if !token_email.eq_ignore_ascii_case(email) {
                return Err(AuthError::IdentityMismatch);
            }
        }

        Ok(Identity::verified(email, credentials.name.clone()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
