//! Thin async wrapper over the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// One `git` command line plus extra environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInvocation {
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl GitInvocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.envs.extend(vars);
        self
    }

    /// Git subcommand (first argument), for logging.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }
}

/// Captured result of a finished git process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best available diagnostic text.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() { self.stdout.trim() } else { stderr }
    }
}

/// The process could not be run to completion. A non-zero exit status is not
/// an error at this level; it is reported through [`GitOutput::success`].
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {subcommand} timed out after {timeout:?}")]
    TimedOut {
        subcommand: String,
        timeout: Duration,
    },
}

/// Runs git commands against one working tree.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Working tree the commands run in.
    fn workdir(&self) -> &Path;

    async fn run(&self, invocation: &GitInvocation) -> Result<GitOutput, GitError>;
}

/// [`GitRunner`] backed by the system `git` binary.
#[derive(Debug, Clone)]
pub struct ProcessGit {
    program: String,
    workdir: PathBuf,
    timeout: Duration,
}

impl ProcessGit {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: "git".to_string(),
            workdir: workdir.into(),
            timeout,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl GitRunner for ProcessGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn run(&self, invocation: &GitInvocation) -> Result<GitOutput, GitError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&invocation.args)
            .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| GitError::TimedOut {
                subcommand: invocation.subcommand().to_string(),
                timeout: self.timeout,
            })?
            .map_err(GitError::Spawn)?;

        Ok(GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
