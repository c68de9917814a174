//! Authentication gate settings.

/// How the authentication gate is configured.
///
/// Verification is on whenever the deployment is production *or*
/// access-control is switched on; the development identity is only ever
/// handed out when both are off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub production: bool,
    pub access_enabled: bool,
    /// Trust domain, e.g. `acme.cloudflareaccess.com`.
    pub team_domain: Option<String>,
    /// Expected `aud` claim.
    pub audience: Option<String>,
    pub dev_email: String,
    pub dev_name: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            production: false,
            access_enabled: false,
            team_domain: None,
            audience: None,
            dev_email: "dev@example.com".to_string(),
            dev_name: "Development User".to_string(),
        }
    }
}

impl AuthSettings {
    pub fn requires_verification(&self) -> bool {
        self.production || self.access_enabled
    }
}
