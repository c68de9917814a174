//! Transient credentials for the remote repository.
//!
//! Credentials are only ever combined with the repository URL in memory, at
//! the moment a push or pull runs. Nothing credential-bearing is written to
//! `.git/config`: the configured `origin` is the plain URL.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use url::Url;

use super::SyncError;

const REDACTED: &str = "***";

#[derive(Clone)]
pub struct RemoteCredentials {
    url: String,
    username: String,
    token: String,
}

impl core::fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("token", &REDACTED)
            .finish()
    }
}

impl RemoteCredentials {
    pub fn new(url: impl Into<String>, username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            token: token.into(),
        }
    }

    /// Repository URL without credentials (safe to persist as `origin`).
    pub fn public_url(&self) -> &str {
        &self.url
    }

    /// Repository URL with `user:token@` embedded. `file://` remotes are
    /// returned unchanged.
    pub fn authenticated_url(&self) -> Result<String, SyncError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| SyncError::InvalidRemote(format!("{}: {e}", self.url)))?;
        // Local remotes need no credentials.
        if url.scheme() == "file" {
            return Ok(self.url.clone());
        }
        if !matches!(url.scheme(), "https" | "http") {
            return Err(SyncError::InvalidRemote(format!(
                "{}: only http(s) remotes accept token credentials",
                self.url
            )));
        }
        url.set_username(&self.username)
            .and_then(|()| url.set_password(Some(&self.token)))
            .map_err(|()| SyncError::InvalidRemote(format!("{}: cannot carry credentials", self.url)))?;
        Ok(url.into())
    }

    /// Environment handed to credential-bearing git commands: no interactive
    /// prompts, plus a basic-auth header for transports that ignore URL
    /// credentials.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
            ("GIT_CONFIG_COUNT".to_string(), "1".to_string()),
            ("GIT_CONFIG_KEY_0".to_string(), "http.extraHeader".to_string()),
            (
                "GIT_CONFIG_VALUE_0".to_string(),
                format!("Authorization: Basic {}", self.basic_auth()),
            ),
        ]
    }

    /// Scrub every form of the secret from diagnostic text.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        let mut secrets = vec![self.basic_auth(), self.token.clone()];
        if let Ok(mut url) = Url::parse(&self.url) {
            if url.set_password(Some(&self.token)).is_ok() {
                if let Some(encoded) = url.password() {
                    secrets.push(encoded.to_string());
                }
            }
        }
        for secret in secrets.iter().filter(|s| !s.is_empty()) {
            out = out.replace(secret.as_str(), REDACTED);
        }
        out
    }

    fn basic_auth(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> RemoteCredentials {
        RemoteCredentials::new("https://github.com/acme/notes.git", "x-access-token", "ghp_s3cr3t/+=")
    }

    #[test]
    fn authenticated_url_embeds_encoded_credentials() {
        let url = creds().authenticated_url().unwrap();
        assert!(url.starts_with("https://x-access-token:"));
        assert!(url.ends_with("@github.com/acme/notes.git"));
        assert!(!url.contains("ghp_s3cr3t/+="));
    }

    #[test]
    fn non_http_remotes_are_rejected() {
        let c = RemoteCredentials::new("git@github.com:acme/notes.git", "u", "t");
        assert!(matches!(c.authenticated_url(), Err(SyncError::InvalidRemote(_))));

        let c = RemoteCredentials::new("ssh://git@github.com/acme/notes.git", "u", "t");
        assert!(matches!(c.authenticated_url(), Err(SyncError::InvalidRemote(_))));
    }

    #[test]
    fn file_remotes_pass_through() {
        let c = RemoteCredentials::new("file:///srv/git/notes.git", "u", "t");
        assert_eq!(c.authenticated_url().unwrap(), "file:///srv/git/notes.git");
    }

    #[test]
    fn env_disables_prompts_and_carries_basic_auth() {
        let env = creds().env();
        assert!(env.contains(&("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())));
        let header = &env.iter().find(|(k, _)| k == "GIT_CONFIG_VALUE_0").unwrap().1;
        assert!(header.starts_with("Authorization: Basic "));
    }

    #[test]
    fn redaction_covers_raw_encoded_and_header_forms() {
        let c = creds();
        let url = c.authenticated_url().unwrap();
        let header = c.env().pop().unwrap().1;
        let noisy = format!("fatal: could not read from {url}\ntoken=ghp_s3cr3t/+= {header}");

        let clean = c.redact(&noisy);
        assert!(!clean.contains("s3cr3t"));
        assert!(!clean.contains(&c.basic_auth()));
        assert!(clean.contains("github.com/acme/notes.git"));
    }

    #[test]
    fn debug_hides_token() {
        assert!(!format!("{:?}", creds()).contains("s3cr3t"));
    }
}
