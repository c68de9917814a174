//! Scripted git double for sync tests: records invocations and answers by
//! subcommand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::git::{GitError, GitInvocation, GitOutput, GitRunner};

pub struct ScriptedGit {
    workdir: PathBuf,
    calls: Mutex<Vec<GitInvocation>>,
    overrides: Mutex<HashMap<&'static str, GitOutput>>,
    push_gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedGit {
    /// Defaults describe a repository with a staged change on `main` and no
    /// `origin` remote yet.
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            overrides: Mutex::new(HashMap::new()),
            push_gate: None,
        }
    }

    /// Make `push` signal `entered` and then wait for `release`.
    pub fn with_push_gate(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.push_gate = Some((entered, release));
        self
    }

    pub fn answer(&self, subcommand: &'static str, output: GitOutput) {
        self.lock_overrides().insert(subcommand, output);
    }

    pub fn calls(&self) -> Vec<GitInvocation> {
        self.lock_calls().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.subcommand().to_string()).collect()
    }

    pub fn find(&self, subcommand: &str) -> Option<GitInvocation> {
        self.calls().into_iter().find(|c| c.subcommand() == subcommand)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<GitInvocation>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_overrides(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, GitOutput>> {
        self.overrides.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl GitRunner for ScriptedGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn run(&self, invocation: &GitInvocation) -> Result<GitOutput, GitError> {
        self.lock_calls().push(invocation.clone());

        let sub = invocation.subcommand();
        if sub == "push" {
            if let Some((entered, release)) = &self.push_gate {
                entered.notify_one();
                release.notified().await;
            }
        }

        if let Some(out) = self.lock_overrides().get(sub).cloned() {
            return Ok(out);
        }
        Ok(match sub {
            "diff" => GitOutput::ok("comments.json\n"),
            "rev-parse" => GitOutput::ok("main\n"),
            "rev-list" => GitOutput::ok("0\n"),
            "remote" if invocation.args.get(1).map(String::as_str) == Some("get-url") => {
                GitOutput::failed(2, "error: No such remote 'origin'")
            }
            _ => GitOutput::ok(""),
        })
    }
}
