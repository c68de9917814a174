use serde::{Deserialize, Serialize};

use annotate_core::Actor;

/// Authenticated user for the duration of one request.
///
/// `id` is the email: there is no account store behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub id: String,

    /// `false` for the development fallback identity.
    #[serde(skip)]
    pub verified: bool,
}

impl Identity {
    /// Identity backed by a verified access token. A missing name falls back
    /// to the local part of the email.
    pub fn verified(email: impl Into<String>, name: Option<String>) -> Self {
        let email = email.into();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| local_part(&email).to_string());
        Self {
            id: email.clone(),
            email,
            name: Some(name),
            verified: true,
        }
    }

    /// Fixed identity used when verification is disabled.
    pub fn development(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
            id: "dev-user-id".to_string(),
            verified: false,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Authorship view of this identity for comment mutations.
    pub fn actor(&self) -> Actor {
        if self.verified {
            Actor::verified(self.display_name(), &self.email, &self.id)
        } else {
            Actor::unverified(self.display_name(), &self.email, &self.id)
        }
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
