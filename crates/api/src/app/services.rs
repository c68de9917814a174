use std::sync::Arc;

use annotate_infra::{
    AppConfig, DocumentLibrary, FileCommentStore, GitRunner, ProcessGit, StoreError,
    SyncCoordinator,
};

/// Everything the handlers work against.
#[derive(Clone)]
pub struct AppServices {
    pub comments: Arc<FileCommentStore>,
    pub sync: Arc<SyncCoordinator>,
    pub documents: Arc<DocumentLibrary>,
}

impl AppServices {
    /// `sync` should be attached to the same store as `comments` so pulls
    /// hold off writes.
    pub fn new(
        comments: Arc<FileCommentStore>,
        sync: SyncCoordinator,
        documents: DocumentLibrary,
    ) -> Self {
        Self {
            comments,
            sync: Arc::new(sync),
            documents: Arc::new(documents),
        }
    }

    /// Wire the file-backed adapters rooted at the configured data directory.
    pub fn from_config(config: &AppConfig) -> Self {
        let git: Arc<dyn GitRunner> = Arc::new(ProcessGit::new(&config.data_dir, config.process_timeout));
        let comments = Arc::new(FileCommentStore::new(config.comments_path()));
        Self::new(
            comments.clone(),
            SyncCoordinator::new(git, config.sync.clone()).with_store(comments),
            DocumentLibrary::new(&config.data_dir, &config.pandoc_path, config.process_timeout),
        )
    }

    /// Create the data directory and an empty comment database if absent.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.comments.initialize().await
    }
}
