//! Data Transfer Objects - request/response types for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Login form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Create/edit form submission for a post. Values stay raw strings until
/// the domain layer validates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub event_time: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Comma-separated attachment ids from earlier uploads.
    #[serde(default, rename = "attachmentIds")]
    pub attachment_ids: String,
    /// `delete` turns an edit submission into a soft delete.
    #[serde(default)]
    pub action: Option<String>,
}

/// Response to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Thumbnail URL. May 404 until the thumbnail job has run.
    pub url: String,
    /// Download URL for the original file.
    pub href: String,
    pub attachment_id: String,
    pub file_hash: String,
}
