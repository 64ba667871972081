//! Filesystem blob store rooted at the upload directory.
//!
//! Streamed writes go to `<root>/.staging/<uuid>.part` and are renamed into
//! place on commit, so a blob is either absent or complete.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use daylog_core::ports::{BlobError, BlobReader, BlobStore, CommitOutcome, StagedBlob};

const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (and create if needed) a store at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR))
            .await
            .map_err(io_err)?;

        tracing::info!(root = %root.display(), "Blob store opened");
        Ok(Self { root })
    }

    /// Map a relative blob path onto the filesystem, refusing anything
    /// that could leave the root or reach the staging area.
    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let invalid = || BlobError::InvalidPath(path.to_string());

        if path.is_empty() || path.contains('\\') || path.starts_with(STAGING_DIR) {
            return Err(invalid());
        }

        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid());
        }

        Ok(self.root.join(relative))
    }

    fn staging_file(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(format!("{}.part", uuid::Uuid::new_v4()))
    }
}

fn io_err(e: std::io::Error) -> BlobError {
    BlobError::Io(e.to_string())
}

async fn ensure_parent(target: &Path) -> Result<(), BlobError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn stage(&self) -> Result<Box<dyn StagedBlob>, BlobError> {
        let path = self.staging_file();
        let file = fs::File::create(&path).await.map_err(io_err)?;

        Ok(Box::new(FsStagedBlob {
            store: self.clone(),
            file: Some(file),
            path,
            done: false,
        }))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let target = self.resolve(path)?;
        ensure_parent(&target).await?;

        let tmp = self.staging_file();
        fs::write(&tmp, bytes).await.map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let target = self.resolve(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(e) => Err(io_err(e)),
        }
    }

    async fn open(&self, path: &str) -> Result<BlobReader, BlobError> {
        let target = self.resolve(path)?;
        let file = match fs::File::open(&target).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(path.to_string()));
            }
            Err(e) => return Err(io_err(e)),
        };

        let metadata = file.metadata().await.map_err(io_err)?;
        if !metadata.is_file() {
            return Err(BlobError::NotFound(path.to_string()));
        }

        Ok(BlobReader {
            size: metadata.len(),
            stream: ReaderStream::new(file).map_err(io_err).boxed(),
        })
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        let target = self.resolve(path)?;
        fs::try_exists(&target).await.map_err(io_err)
    }
}

struct FsStagedBlob {
    store: FsBlobStore,
    file: Option<fs::File>,
    path: PathBuf,
    done: bool,
}

impl FsStagedBlob {
    async fn close(&mut self) -> Result<(), BlobError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(io_err)?;
            file.sync_all().await.map_err(io_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl StagedBlob for FsStagedBlob {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), BlobError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| BlobError::Io("staged blob already closed".to_string()))?;
        file.write_all(chunk).await.map_err(io_err)
    }

    async fn commit(mut self: Box<Self>, path: &str) -> Result<CommitOutcome, BlobError> {
        let target = self.store.resolve(path)?;
        self.close().await?;

        if fs::try_exists(&target).await.map_err(io_err)? {
            fs::remove_file(&self.path).await.map_err(io_err)?;
            self.done = true;
            tracing::debug!(path, "Blob already present, staged copy dropped");
            return Ok(CommitOutcome::AlreadyPresent);
        }

        ensure_parent(&target).await?;
        fs::rename(&self.path, &target).await.map_err(io_err)?;
        self.done = true;

        tracing::debug!(path, "Blob stored");
        Ok(CommitOutcome::Stored)
    }

    async fn discard(mut self: Box<Self>) -> Result<(), BlobError> {
        self.file.take();
        fs::remove_file(&self.path).await.map_err(io_err)?;
        self.done = true;
        Ok(())
    }
}

impl Drop for FsStagedBlob {
    // An abandoned upload (e.g. the client went away mid-stream) must not
    // leave its partial file behind.
    fn drop(&mut self) {
        if !self.done {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
