//! Content-addressed attachment ingestion.
//!
//! Uploads are streamed through a SHA-256 hasher into a staging blob, then
//! committed under a path derived from the digest. Identical content always
//! lands on the same path, so a second upload of the same bytes only costs
//! a new metadata row. Thumbnails are derived later by a background job.

use std::fmt::Display;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::Attachment;
use crate::ports::{AttachmentRepository, BlobStore, CommitOutcome, Job, JobQueue, StagedBlob};

/// Job type routed to the thumbnail worker.
pub const THUMBNAIL_JOB: &str = "attachment.thumbnail";

const MAX_EXTENSION_LEN: usize = 8;

/// Payload of a [`THUMBNAIL_JOB`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub source: String,
    pub target: String,
}

/// Where a piece of content and its thumbnail live in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    pub file: String,
    pub thumbnail: String,
}

/// Derive storage paths from a hex digest and the client's filename.
///
/// The extension is kept only when it is short ASCII alphanumeric text,
/// and is always lowercased.
pub fn content_path(hash: &str, filename: Option<&str>) -> ContentPath {
    let ext = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    ContentPath {
        file: format!("{}/{hash}{ext}", shard(hash)),
        thumbnail: thumbnail_path(hash),
    }
}

pub fn thumbnail_path(hash: &str) -> String {
    format!("{}/{hash}-thumb.jpg", shard(hash))
}

fn shard(hash: &str) -> &str {
    hash.get(..2).unwrap_or(hash)
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The upload stream broke before it was fully hashed.
    #[error("Upload stream failed: {0}")]
    Hashing(String),

    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Storage failed: {0}")]
    Storage(String),
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub attachment: Attachment,
    pub thumbnail_path: String,
    /// The content was already stored by an earlier upload.
    pub deduplicated: bool,
}

pub struct AttachmentIngestor {
    blobs: Arc<dyn BlobStore>,
    attachments: Arc<dyn AttachmentRepository>,
    jobs: Arc<dyn JobQueue>,
    max_bytes: u64,
}

impl AttachmentIngestor {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        attachments: Arc<dyn AttachmentRepository>,
        jobs: Arc<dyn JobQueue>,
        max_bytes: u64,
    ) -> Self {
        Self {
            blobs,
            attachments,
            jobs,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Ingest one uploaded file.
    ///
    /// On any error the staged bytes are discarded and no attachment row is
    /// written. Thumbnail scheduling problems are logged, never returned.
    pub async fn ingest_stream<S, B, E>(
        &self,
        filename: Option<&str>,
        stream: S,
    ) -> Result<Ingested, IngestError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut staged = self
            .blobs
            .stage()
            .await
            .map_err(|e| IngestError::Storage(e.to_string()))?;

        let mut hasher = Sha256::new();
        let mut size: u64 = 0;
        let mut stream = pin!(stream);

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    abandon(staged).await;
                    return Err(IngestError::Hashing(e.to_string()));
                }
            };
            let bytes = chunk.as_ref();

            size += bytes.len() as u64;
            if size > self.max_bytes {
                abandon(staged).await;
                return Err(IngestError::TooLarge {
                    limit: self.max_bytes,
                });
            }

            hasher.update(bytes);
            if let Err(e) = staged.write_chunk(bytes).await {
                abandon(staged).await;
                return Err(IngestError::Storage(e.to_string()));
            }
        }

        let hash = hex::encode(hasher.finalize());
        let path = content_path(&hash, filename);

        let outcome = staged
            .commit(&path.file)
            .await
            .map_err(|e| IngestError::Storage(e.to_string()))?;
        let deduplicated = outcome == CommitOutcome::AlreadyPresent;

        self.schedule_thumbnail(&path).await;

        let attachment = self
            .attachments
            .save(Attachment::new(path.file.clone(), hash))
            .await
            .map_err(|e| IngestError::Storage(e.to_string()))?;

        tracing::info!(
            attachment_id = %attachment.id,
            file_hash = %attachment.file_hash,
            size,
            deduplicated,
            "Attachment ingested"
        );

        Ok(Ingested {
            attachment,
            thumbnail_path: path.thumbnail,
            deduplicated,
        })
    }

    async fn schedule_thumbnail(&self, path: &ContentPath) {
        match self.blobs.exists(&path.thumbnail).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(thumbnail = %path.thumbnail, error = %e, "Thumbnail lookup failed");
            }
        }

        let payload = ThumbnailJob {
            source: path.file.clone(),
            target: path.thumbnail.clone(),
        };
        let payload = match serde_json::to_value(&payload) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail job could not be encoded");
                return;
            }
        };

        if let Err(e) = self.jobs.enqueue(Job::new(THUMBNAIL_JOB, payload)).await {
            tracing::warn!(source = %path.file, error = %e, "Thumbnail job not scheduled");
        }
    }
}

async fn abandon(staged: Box<dyn StagedBlob>) {
    if let Err(e) = staged.discard().await {
        tracing::warn!(error = %e, "Failed to discard staged upload");
    }
}
