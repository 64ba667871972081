//! Thumbnail derivation for uploaded images.
//!
//! Decoding and resizing are CPU bound, so they run on the blocking pool
//! via `spawn_blocking`; the job handler only moves bytes in and out of
//! the blob store.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use daylog_core::ports::{BlobError, BlobStore, Job, JobHandler, JobResult, job_handler};
use daylog_core::services::ThumbnailJob;

/// Thumbnail configuration.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailConfig {
    /// Edge length of the square thumbnail.
    pub size: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: 500,
            quality: 85,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(String),

    #[error("Thumbnail task panicked: {0}")]
    Task(String),
}

#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
}

impl ThumbnailGenerator {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Center-crop `source` to a square and scale it to `size` (blocking).
    pub fn render(&self, source: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
        let img =
            image::load_from_memory(source).map_err(|e| ThumbnailError::Decode(e.to_string()))?;

        let size = self.config.size.max(1);
        let thumb = img.resize_to_fill(size, size, FilterType::CatmullRom);
        let rgb = thumb.to_rgb8();

        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, self.config.quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| ThumbnailError::Encode(e.to_string()))?;

        Ok(out.into_inner())
    }

    /// [`render`](Self::render) on the blocking thread pool.
    pub async fn render_async(self: Arc<Self>, source: Vec<u8>) -> Result<Vec<u8>, ThumbnailError> {
        tokio::task::spawn_blocking(move || self.render(&source))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))?
    }
}

/// Job handler for `THUMBNAIL_JOB`: read the source blob, render, write
/// the thumbnail blob.
///
/// Transient storage errors are retried; unreadable payloads and images
/// that cannot be decoded fail permanently.
pub fn thumbnail_job_handler(
    blobs: Arc<dyn BlobStore>,
    generator: Arc<ThumbnailGenerator>,
) -> JobHandler {
    job_handler(move |job: Job| {
        let blobs = blobs.clone();
        let generator = generator.clone();
        async move { run(blobs, generator, job).await }
    })
}

async fn run(blobs: Arc<dyn BlobStore>, generator: Arc<ThumbnailGenerator>, job: Job) -> JobResult {
    let task: ThumbnailJob = match serde_json::from_value(job.payload) {
        Ok(task) => task,
        Err(e) => return JobResult::Failed(format!("invalid thumbnail payload: {e}")),
    };

    let source = match blobs.read(&task.source).await {
        Ok(bytes) => bytes,
        Err(e @ (BlobError::NotFound(_) | BlobError::InvalidPath(_))) => {
            return JobResult::Failed(e.to_string());
        }
        Err(e) => return JobResult::Retry(e.to_string()),
    };

    let thumbnail = match generator.render_async(source).await {
        Ok(bytes) => bytes,
        Err(e) => return JobResult::Failed(e.to_string()),
    };

    match blobs.write(&task.target, &thumbnail).await {
        Ok(()) => {
            tracing::info!(
                source = %task.source,
                target = %task.target,
                size = thumbnail.len(),
                "Thumbnail generated"
            );
            JobResult::Success
        }
        Err(e @ BlobError::InvalidPath(_)) => JobResult::Failed(e.to_string()),
        Err(e) => JobResult::Retry(e.to_string()),
    }
}
