//! Infrastructure layer: comment file, git remote, documents, configuration.

pub mod comment_store;
pub mod config;
pub mod documents;
pub mod git;
pub mod sync;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use comment_store::{FileCommentStore, StoreError};
pub use config::{AppConfig, ConfigError};
pub use documents::{DocumentError, DocumentLibrary};
pub use git::{GitError, GitInvocation, GitOutput, GitRunner, ProcessGit};
pub use sync::{
    PullOutcome, SyncCoordinator, SyncError, SyncOutcome, SyncPoller, SyncPollerHandle,
    SyncSettings,
};
