//! Git-backed synchronization of the comment database.
//!
//! - `coordinator`: the single-flight sync (stage → commit → push) and pull
//! - `poller`: the background pull loop and its shutdown handle
//! - `remote`: transient credentials for talking to the remote

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod coordinator;
pub mod poller;
pub mod remote;

pub use coordinator::{PullOutcome, SyncCoordinator, SyncOutcome};
pub use poller::{SyncPoller, SyncPollerHandle};
pub use remote::RemoteCredentials;

/// Shortest allowed background pull period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Longest allowed background pull period.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_BRANCH: &str = "main";

/// Clamp a configured pull period into [`MIN_POLL_INTERVAL`, `MAX_POLL_INTERVAL`].
pub fn clamp_poll_interval(requested: Duration) -> Duration {
    requested.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Remote repository (https). Unset = sync not configured.
    pub repo_url: Option<String>,
    pub username: String,
    /// Remote credential secret. Unset = sync not configured.
    pub token: Option<String>,
    /// Comment file, relative to the working tree.
    pub comments_file: PathBuf,
    pub poll_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            repo_url: None,
            username: "x-access-token".to_string(),
            token: None,
            comments_file: PathBuf::from("comments.json"),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SyncSettings {
    pub fn credentials(&self) -> Option<RemoteCredentials> {
        let url = self.repo_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.token.as_deref().filter(|s| !s.is_empty())?;
        Some(RemoteCredentials::new(url, self.username.as_str(), token))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("remote sync is not configured (repository URL and token are required)")]
    NotConfigured,

    #[error("a sync is already in progress")]
    InProgress,

    #[error("invalid remote repository URL {0}")]
    InvalidRemote(String),

    /// A git step failed; `detail` is the redacted diagnostic output.
    #[error("git {step} failed: {detail}")]
    Git { step: &'static str, detail: String },

    #[error("failed to inspect working tree: {0}")]
    Workdir(String),

    /// A pull produced a comment file that does not parse. The working tree
    /// has been put back to its pre-pull state.
    #[error("pulled comment database is unreadable: {0}")]
    CorruptPull(String),
}
