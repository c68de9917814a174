//! File-backed comment store.
//!
//! The whole database lives in one pretty-printed JSON file (so it diffs well
//! under git). Every mutation is a full read → mutate → write cycle; the cycle
//! runs under an async mutex so concurrent requests in this process never
//! interleave. Other processes writing the same file are not coordinated with.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use annotate_core::{Actor, Comment, CommentDatabase, CommentId, CommentPatch, DomainError, NewComment};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("comment database {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize comments: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub struct FileCommentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCommentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty database if none exists yet.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if !exists {
            self.persist(&CommentDatabase::new()).await?;
            info!(path = %self.path.display(), "created empty comment database");
        }
        Ok(())
    }

    /// All comments, or those attached to `document_ref`, in storage order.
    ///
    /// An unreadable database lists as empty instead of failing the request.
    pub async fn list(&self, document_ref: Option<&str>) -> Vec<Comment> {
        let db = match self.load().await {
            Ok(db) => db,
            Err(e) => {
                warn!(error = %e, "reading comments failed; serving an empty list");
                return Vec::new();
            }
        };
        match document_ref {
            Some(doc) => db.for_document(doc).cloned().collect(),
            None => db.into_comments(),
        }
    }

    pub async fn create(&self, new: NewComment, actor: &Actor) -> Result<Comment, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await?;
        let comment = db.insert(new, actor, Utc::now())?;
        self.persist(&db).await?;
        debug!(comment_id = %comment.id, document = %comment.document_ref, "comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        id: &CommentId,
        patch: CommentPatch,
        actor: &Actor,
    ) -> Result<Comment, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await?;
        let comment = db.update(id, patch, actor, Utc::now())?;
        self.persist(&db).await?;
        debug!(comment_id = %id, "comment updated");
        Ok(comment)
    }

    pub async fn delete(&self, id: &CommentId) -> Result<Comment, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await?;
        let removed = db.remove(id)?;
        self.persist(&db).await?;
        debug!(comment_id = %id, "comment deleted");
        Ok(removed)
    }

    /// Hold off every mutation until the guard is dropped. Used by the sync
    /// pull, which rewrites the file underneath the store.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Check that the file on disk still parses. Does not take the lock.
    pub async fn verify(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }

    /// A missing file reads as an empty database. A present but unreadable
    /// one is an error, so a mutation never overwrites comments it could not see.
    async fn load(&self) -> Result<CommentDatabase, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CommentDatabase::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a sibling temp file, then rename over the database.
    async fn persist(&self, db: &CommentDatabase) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec_pretty(db).map_err(StoreError::Serialize)?;
        bytes.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}
