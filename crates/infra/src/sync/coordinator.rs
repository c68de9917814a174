//! Single-flight sync against the remote repository.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use annotate_core::Actor;

use super::{DEFAULT_BRANCH, RemoteCredentials, SyncError, SyncSettings};
use crate::comment_store::FileCommentStore;
use crate::git::{GitInvocation, GitOutput, GitRunner};

const SERVICE_NAME: &str = "annotate";
const SERVICE_EMAIL: &str = "annotate@localhost";

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// `false` when there was nothing to commit or push.
    pub synced: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Pulled { branch: String },
    /// No remote credentials; nothing to pull from.
    NotConfigured,
    /// A sync or another pull held the flag; this attempt was skipped.
    Busy,
    /// The comment file has uncommitted edits; pulling waits for the next sync.
    LocalChanges,
}

/// Releases the in-flight flag when dropped, on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Commits and exchanges the comment file with the remote.
///
/// At most one sync or pull runs at a time per coordinator. A second caller
/// is turned away immediately instead of waiting. The flag belongs to this
/// instance, so separate coordinators lock independently.
///
/// When a store is attached, a pull holds the store's write lock for its whole
/// duration and checks the pulled file still parses.
pub struct SyncCoordinator {
    git: Arc<dyn GitRunner>,
    settings: SyncSettings,
    store: Option<Arc<FileCommentStore>>,
    in_flight: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(git: Arc<dyn GitRunner>, settings: SyncSettings) -> Self {
        Self {
            git,
            settings,
            store: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Attach the store whose file this coordinator syncs.
    pub fn with_store(mut self, store: Arc<FileCommentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Stage, commit and push the comment file on behalf of `actor`.
    ///
    /// Commits left behind by an earlier failed push are pushed even when
    /// nothing new is staged.
    pub async fn sync(&self, actor: &Actor, now: DateTime<Utc>) -> Result<SyncOutcome, SyncError> {
        let creds = self.settings.credentials().ok_or(SyncError::NotConfigured)?;
        let _flight = self.try_begin().ok_or(SyncError::InProgress)?;

        info!(actor = %actor.email, "sync started");
        let result = self.commit_and_push(&creds, actor, now).await;
        match &result {
            Ok(outcome) => info!(synced = outcome.synced, branch = ?outcome.branch, "sync finished"),
            Err(e) => warn!(error = %e, "sync failed"),
        }
        result
    }

    /// Bring remote changes into the working tree.
    ///
    /// Skipped while the comment file has uncommitted edits. A pull that fails
    /// is rolled back with `rebase --abort`; one that leaves an unparseable
    /// comment file is reset to the previous commit.
    pub async fn pull(&self) -> Result<PullOutcome, SyncError> {
        let Some(creds) = self.settings.credentials() else {
            return Ok(PullOutcome::NotConfigured);
        };
        let Some(_flight) = self.try_begin() else {
            return Ok(PullOutcome::Busy);
        };
        let _store_guard = match &self.store {
            Some(store) => Some(store.exclusive().await),
            None => None,
        };

        self.ensure_repository(&creds).await?;

        let file = self.comments_file();
        let status = self
            .checked(
                "status",
                &GitInvocation::new(["status", "--porcelain", "--", file.as_str()]),
                None,
            )
            .await?;
        if !status.stdout.trim().is_empty() {
            debug!(status = %status.stdout.trim(), "comment file has local edits; pull deferred");
            return Ok(PullOutcome::LocalChanges);
        }

        let before = self.head_commit().await;
        let branch = self.current_branch().await;
        let pull = GitInvocation::new([
            "pull".to_string(),
            "--rebase".to_string(),
            creds.authenticated_url()?,
            branch.clone(),
        ])
        .envs(creds.env())
        .envs(committer_env(SERVICE_NAME, SERVICE_EMAIL));
        if let Err(e) = self.checked("pull", &pull, Some(&creds)).await {
            let abort = GitInvocation::new(["rebase", "--abort"]);
            if let Ok(out) = self.run("rebase", &abort, None).await {
                debug!(success = out.success, "rebase abort after failed pull");
            }
            return Err(e);
        }

        self.mark_remote(&branch, "FETCH_HEAD").await;

        if let Some(store) = &self.store {
            if let Err(e) = store.verify().await {
                warn!(error = %e, "pulled comment database is unreadable; restoring");
                let mut detail = e.to_string();
                match before {
                    Some(commit) => {
                        let reset = GitInvocation::new(["reset", "--keep", commit.as_str()]);
                        if let Err(reset_err) = self.checked("reset", &reset, None).await {
                            detail = format!("{detail}; restore failed: {reset_err}");
                        }
                    }
                    None => detail = format!("{detail}; no earlier commit to restore"),
                }
                return Err(SyncError::CorruptPull(detail));
            }
        }

        Ok(PullOutcome::Pulled { branch })
    }

    async fn commit_and_push(
        &self,
        creds: &RemoteCredentials,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        self.ensure_repository(creds).await?;

        let file = self.comments_file();
        self.checked("add", &GitInvocation::new(["add", "--", file.as_str()]), None)
            .await?;

        let staged = self
            .checked(
                "diff",
                &GitInvocation::new(["diff", "--cached", "--name-only", "--", file.as_str()]),
                None,
            )
            .await?;
        let has_staged = !staged.stdout.trim().is_empty();

        if has_staged {
            let message = commit_message(&actor.email, now);
            let commit = GitInvocation::new(["commit", "-m", message.as_str(), "--", file.as_str()])
                .envs(author_env(&actor.display_name, &actor.email))
                .envs(committer_env(&actor.display_name, &actor.email));
            self.checked("commit", &commit, None).await?;
        }

        let branch = self.current_branch().await;
        if !has_staged && !self.has_unpushed_commits(&branch).await {
            debug!("no staged changes and nothing unpushed");
            return Ok(SyncOutcome {
                synced: false,
                message: "No changes to sync".to_string(),
                branch: None,
            });
        }

        let push = GitInvocation::new([
            "push".to_string(),
            creds.authenticated_url()?,
            format!("HEAD:{branch}"),
        ])
        .envs(creds.env());
        self.checked("push", &push, Some(creds)).await?;
        self.mark_remote(&branch, "HEAD").await;

        Ok(SyncOutcome {
            synced: true,
            message: format!("Comments synced to {branch}"),
            branch: Some(branch),
        })
    }

    /// Initialize the working tree and register `origin` (without
    /// credentials) if either is missing.
    async fn ensure_repository(&self, creds: &RemoteCredentials) -> Result<(), SyncError> {
        let git_dir = self.git.workdir().join(".git");
        let initialized = tokio::fs::try_exists(&git_dir)
            .await
            .map_err(|e| SyncError::Workdir(e.to_string()))?;
        if !initialized {
            info!(workdir = %self.git.workdir().display(), "initializing local repository");
            self.checked("init", &GitInvocation::new(["init"]), None).await?;
        }

        let origin = self
            .run("remote", &GitInvocation::new(["remote", "get-url", "origin"]), None)
            .await?;
        if !origin.success {
            info!(url = %creds.public_url(), "adding origin remote");
            self.checked(
                "remote",
                &GitInvocation::new(["remote", "add", "origin", creds.public_url()]),
                None,
            )
            .await?;
        }
        Ok(())
    }

    fn comments_file(&self) -> String {
        self.settings.comments_file.to_string_lossy().into_owned()
    }

    /// Current branch name, or [`DEFAULT_BRANCH`] when it cannot be told
    /// (unborn branch, detached head, git failure).
    async fn current_branch(&self) -> String {
        let query = GitInvocation::new(["rev-parse", "--abbrev-ref", "HEAD"]);
        match self.git.run(&query).await {
            Ok(out) if out.success => {
                let name = out.stdout.trim();
                if name.is_empty() || name == "HEAD" {
                    DEFAULT_BRANCH.to_string()
                } else {
                    name.to_string()
                }
            }
            _ => DEFAULT_BRANCH.to_string(),
        }
    }

    async fn head_commit(&self) -> Option<String> {
        let query = GitInvocation::new(["rev-parse", "--verify", "--quiet", "HEAD"]);
        match self.git.run(&query).await {
            Ok(out) if out.success && !out.stdout.trim().is_empty() => Some(out.stdout.trim().to_string()),
            _ => None,
        }
    }

    fn remote_ref(branch: &str) -> String {
        format!("refs/remotes/origin/{branch}")
    }

    /// Local commits the remote has not seen. With no record of the remote
    /// branch, any commit counts as unpushed.
    async fn has_unpushed_commits(&self, branch: &str) -> bool {
        if self.head_commit().await.is_none() {
            return false;
        }
        let range = format!("{}..HEAD", Self::remote_ref(branch));
        match self.git.run(&GitInvocation::new(["rev-list", "--count", range.as_str()])).await {
            Ok(out) if out.success => out.stdout.trim().parse::<u64>().map_or(true, |n| n > 0),
            _ => true,
        }
    }

    /// Record `rev` as the last known state of the remote branch.
    async fn mark_remote(&self, branch: &str, rev: &str) {
        let remote_ref = Self::remote_ref(branch);
        let update = GitInvocation::new(["update-ref", remote_ref.as_str(), rev]);
        if let Err(e) = self.checked("update-ref", &update, None).await {
            warn!(error = %e, "failed to record remote branch position");
        }
    }

    async fn run(
        &self,
        step: &'static str,
        invocation: &GitInvocation,
        creds: Option<&RemoteCredentials>,
    ) -> Result<GitOutput, SyncError> {
        self.git.run(invocation).await.map_err(|e| SyncError::Git {
            step,
            detail: redact(creds, &e.to_string()),
        })
    }

    async fn checked(
        &self,
        step: &'static str,
        invocation: &GitInvocation,
        creds: Option<&RemoteCredentials>,
    ) -> Result<GitOutput, SyncError> {
        let out = self.run(step, invocation, creds).await?;
        if out.success {
            Ok(out)
        } else {
            Err(SyncError::Git {
                step,
                detail: redact(creds, out.diagnostics()),
            })
        }
    }
}

fn redact(creds: Option<&RemoteCredentials>, text: &str) -> String {
    match creds {
        Some(c) => c.redact(text),
        None => text.to_string(),
    }
}

/// Keep ASCII letters and digits only.
fn sanitize(value: &str) -> String {
    value.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Commit message naming who synced and when, reduced to characters that are
/// inert in any shell or log pipeline.
pub fn commit_message(identity: &str, at: DateTime<Utc>) -> String {
    let who = sanitize(identity);
    let who = if who.is_empty() { "unknown".to_string() } else { who };
    let when = sanitize(&at.to_rfc3339_opts(SecondsFormat::Secs, true));
    format!("Update comments by {who} at {when}")
}

fn author_env(name: &str, email: &str) -> Vec<(String, String)> {
    vec![
        ("GIT_AUTHOR_NAME".to_string(), name.to_string()),
        ("GIT_AUTHOR_EMAIL".to_string(), email.to_string()),
    ]
}

fn committer_env(name: &str, email: &str) -> Vec<(String, String)> {
    vec![
        ("GIT_COMMITTER_NAME".to_string(), name.to_string()),
        ("GIT_COMMITTER_EMAIL".to_string(), email.to_string()),
    ]
}
