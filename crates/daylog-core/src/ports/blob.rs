//! Blob storage port - path-keyed file storage for attachments.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Outcome of committing a staged blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The staged bytes now live at the target path.
    Stored,
    /// Something was already at the target path; the staged copy was dropped.
    AlreadyPresent,
}

/// Chunks of a blob being read.
pub type ByteStream = BoxStream<'static, Result<Bytes, BlobError>>;

/// An opened blob: its length and a stream over its bytes.
pub struct BlobReader {
    pub size: u64,
    pub stream: ByteStream,
}

/// Path-keyed blob storage. Paths are relative, `/`-separated, and must not
/// escape the store root.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Open a staging area for a streamed write whose final path is not
    /// known yet.
    async fn stage(&self) -> Result<Box<dyn StagedBlob>, BlobError>;

    /// Write a complete blob, replacing any existing one.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError>;

    /// Read a complete blob.
    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// Open a blob for streaming without buffering it.
    async fn open(&self, path: &str) -> Result<BlobReader, BlobError>;

    async fn exists(&self, path: &str) -> Result<bool, BlobError>;
}

/// An in-progress streamed write.
#[async_trait]
pub trait StagedBlob: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), BlobError>;

    /// Move the staged bytes to `path`, unless `path` is already taken.
    async fn commit(self: Box<Self>, path: &str) -> Result<CommitOutcome, BlobError>;

    /// Throw the staged bytes away.
    async fn discard(self: Box<Self>) -> Result<(), BlobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Blob I/O failed: {0}")]
    Io(String),
}
