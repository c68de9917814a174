use serde::{Deserialize, Serialize};

use annotate_core::{CommentId, CommentPatch, NewComment, TextRange};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/comments`. Server-managed fields (id, author, times)
/// are ignored if sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default, alias = "markdownFile")]
    pub document_ref: Option<String>,
    #[serde(flatten)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub in_reply_to: Option<CommentId>,
    #[serde(default)]
    pub resolved: bool,
}

impl From<CreateCommentRequest> for NewComment {
    fn from(body: CreateCommentRequest) -> Self {
        NewComment {
            document_ref: body.document_ref.unwrap_or_default(),
            range: body.range,
            text: body.text,
            in_reply_to: body.in_reply_to,
            resolved: body.resolved,
        }
    }
}

/// Body of `PUT /api/comments/:id`. A range only applies when all four
/// coordinates are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(flatten)]
    pub range: Option<TextRange>,
}

impl From<UpdateCommentRequest> for CommentPatch {
    fn from(body: UpdateCommentRequest) -> Self {
        CommentPatch {
            text: body.text,
            resolved: body.resolved,
            range: body.range,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown_file: Option<String>,
    #[serde(default)]
    pub bib_file: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkdownResponse {
    pub content: String,
}
