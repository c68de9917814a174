//! Comment entity and its field-level lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Actor, CommentId};

/// Line/column span inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl TextRange {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// A stored annotation.
///
/// Pairs that must move together (`resolved_by`/`resolved_at`,
/// `edited_by`/`edited_at`) are only ever written by [`Comment::apply`], which
/// sets or clears both halves at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,

    /// Target document. Older databases call this `markdownFile`.
    #[serde(alias = "markdownFile")]
    pub document_ref: String,

    /// Absent only for replies whose parent was missing at creation time.
    #[serde(flatten)]
    pub range: Option<TextRange>,

    pub text: String,

    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub resolved: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,

    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<CommentId>,

    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub edited_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_by: Option<String>,
}

/// Input for creating a comment. Id and timestamp are always server-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub document_ref: String,
    /// Ignored for replies: they inherit the parent's range.
    pub range: Option<TextRange>,
    pub text: String,
    pub in_reply_to: Option<CommentId>,
    pub resolved: bool,
}

/// Caller-supplied changes to an existing comment. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPatch {
    pub text: Option<String>,
    pub resolved: Option<bool>,
    pub range: Option<TextRange>,
}

impl CommentPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.resolved.is_none() && self.range.is_none()
    }
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some()
    }

    /// Merge a patch onto this comment.
    ///
    /// Transitions are judged against the state *before* the patch:
    /// - `resolved` false→true stamps `resolved_by`/`resolved_at`;
    /// - `resolved: false` clears both;
    /// - a `text` that differs from the stored text stamps `edited_by`/`edited_at`.
    ///
    /// Resolution never touches the edit stamps and vice versa.
    pub fn apply(&mut self, patch: CommentPatch, actor: &Actor, now: DateTime<Utc>) {
        if let Some(resolved) = patch.resolved {
            if resolved && !self.resolved {
                self.resolved = true;
                self.resolved_by = Some(actor.email.clone());
                self.resolved_at = Some(now);
            } else if !resolved {
                self.resolved = false;
                self.resolved_by = None;
                self.resolved_at = None;
            }
        }

        if let Some(text) = patch.text {
            if text != self.text {
                self.text = text;
                self.edited_by = Some(actor.email.clone());
                self.edited_at = Some(now);
            }
        }

        if let Some(range) = patch.range {
            self.range = Some(range);
        }
    }
}
