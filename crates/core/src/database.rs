//! The persisted aggregate: an ordered sequence of comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Actor, Comment, CommentId, CommentPatch, DomainError, DomainResult, NewComment};

/// Whole-document comment database (`{ "comments": [...] }`).
///
/// Storage order is append order. Every mutation is applied to an in-memory
/// copy that the caller then persists as a whole; there are no partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDatabase {
    #[serde(default)]
    comments: Vec<Comment>,
}

impl CommentDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn into_comments(self) -> Vec<Comment> {
        self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Comments attached to `document_ref`, in storage order.
    pub fn for_document<'a>(&'a self, document_ref: &'a str) -> impl Iterator<Item = &'a Comment> + 'a {
        self.comments
            .iter()
            .filter(move |c| c.document_ref == document_ref)
    }

    /// Append a new comment and return the stored copy.
    ///
    /// Replies take the parent's *current* range; a caller-supplied range is
    /// discarded. A reply to a missing parent is stored without a range.
    /// Root comments must carry a range.
    pub fn insert(&mut self, new: NewComment, actor: &Actor, now: DateTime<Utc>) -> DomainResult<Comment> {
        let document_ref = new.document_ref.trim();
        if document_ref.is_empty() {
            return Err(DomainError::validation("documentRef is required"));
        }

        let range = match &new.in_reply_to {
            Some(parent) => self.get(parent).and_then(|p| p.range),
            None => Some(
                new.range
                    .ok_or_else(|| DomainError::validation("a root comment requires a range"))?,
            ),
        };

        let mut id = CommentId::generate();
        while self.get(&id).is_some() {
            id = CommentId::generate();
        }

        let mut comment = Comment {
            id,
            document_ref: document_ref.to_string(),
            range,
            text: new.text,
            author: actor.display_name.clone(),
            author_email: actor.verified.then(|| actor.email.clone()),
            author_id: actor.verified.then(|| actor.id.clone()),
            timestamp: now,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            in_reply_to: new.in_reply_to,
            edited_at: None,
            edited_by: None,
        };
        if new.resolved {
            comment.apply(
                CommentPatch {
                    resolved: Some(true),
                    ..CommentPatch::default()
                },
                actor,
                now,
            );
        }

        self.comments.push(comment.clone());
        Ok(comment)
    }

    /// Merge `patch` onto the comment with `id` and return the updated copy.
    pub fn update(
        &mut self,
        id: &CommentId,
        patch: CommentPatch,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<Comment> {
        let comment = self
            .comments
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| DomainError::not_found(id))?;
        comment.apply(patch, actor, now);
        Ok(comment.clone())
    }

    /// Remove the comment with `id`. Replies are left in place, pointing at a
    /// parent that no longer exists.
    pub fn remove(&mut self, id: &CommentId) -> DomainResult<Comment> {
        let index = self
            .comments
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| DomainError::not_found(id))?;
        Ok(self.comments.remove(index))
    }
}
