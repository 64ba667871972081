use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file. The bytes live in the blob store at `file_path`;
/// this record only tracks ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Relative path inside the upload root, e.g. `ab/abcd...ef.png`.
    pub file_path: String,
    /// Lowercase hex SHA-256 of the content.
    pub file_hash: String,
    pub in_use: bool,
    pub post_id: Option<Uuid>,
}

impl Attachment {
    pub fn new(file_path: impl Into<String>, file_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            file_path: file_path.into(),
            file_hash: file_hash.into(),
            in_use: false,
            post_id: None,
        }
    }
}
