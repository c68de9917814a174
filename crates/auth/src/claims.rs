//! Access token verification.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::{AuthError, KeyCache, KeyCachePolicy, KeySource};

/// Claims read from a verified access token.
///
/// `exp`, `aud` and `iss` are checked by the verifier and not surfaced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

/// Verifies signed access assertions against the trust domain's keys.
///
/// A token is accepted only if its signature checks out against the key named
/// by its `kid` header, it has not expired, its audience matches the
/// configured tag and its issuer is the trust domain.
pub struct AccessTokenVerifier {
    keys: KeyCache,
    audience: String,
    issuer: String,
}

impl AccessTokenVerifier {
    pub fn new(source: Arc<dyn KeySource>, policy: KeyCachePolicy, team_domain: &str, audience: impl Into<String>) -> Self {
        Self {
            keys: KeyCache::new(source, policy),
            audience: audience.into(),
            issuer: format!("https://{}", team_domain.trim_end_matches('/')),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub async fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token header has no key id".to_string()))?;

        let jwk = self.keys.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        // The algorithm comes from the header, but decoding refuses any
        // algorithm outside the selected key's family.
        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let data = decode::<AccessClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}
