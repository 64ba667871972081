//! In-memory port implementations for service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use uuid::Uuid;

use crate::domain::{Attachment, Device, Post};
use crate::error::RepoError;
use crate::filter::PostQuery;
use crate::ports::{
    AttachmentRepository, BaseRepository, BlobError, BlobReader, BlobStore, CommitOutcome,
    DeviceRepository, Job, JobHandler, JobQueue, JobQueueError, PostPage, PostRepository,
    QueueStats, StagedBlob, YearCount,
};

#[derive(Default)]
pub struct MemoryPosts {
    pub rows: Mutex<Vec<Post>>,
}

impl MemoryPosts {
    pub fn with(posts: Vec<Post>) -> Self {
        Self {
            rows: Mutex::new(posts),
        }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|p| p.id != post.id);
        rows.push(post.clone());
        Ok(post)
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn find_live(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.find_by_id(id).await?.filter(|p| !p.is_deleted()))
    }

    async fn query(&self, query: &PostQuery) -> Result<PostPage, RepoError> {
        let mut matching: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.event_time.cmp(&a.event_time).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let posts = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok(PostPage { posts, total })
    }

    async fn year_counts(&self) -> Result<Vec<YearCount>, RepoError> {
        use chrono::Datelike;

        let mut counts: HashMap<i32, u64> = HashMap::new();
        for post in self.rows.lock().unwrap().iter().filter(|p| !p.is_deleted()) {
            *counts.entry(post.event_time.year()).or_default() += 1;
        }
        let mut years: Vec<YearCount> = counts
            .into_iter()
            .map(|(year, count)| YearCount { year, count })
            .collect();
        years.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(years)
    }
}

#[derive(Default)]
pub struct MemoryAttachments {
    pub rows: Mutex<Vec<Attachment>>,
}

#[async_trait]
impl BaseRepository<Attachment, Uuid> for MemoryAttachments {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>, RepoError> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn save(&self, attachment: Attachment) -> Result<Attachment, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|a| a.id != attachment.id);
        rows.push(attachment.clone());
        Ok(attachment)
    }
}

#[async_trait]
impl AttachmentRepository for MemoryAttachments {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|a| ids.contains(&a.id)).cloned().collect())
    }

    async fn find_by_post_ids(&self, post_ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|a| a.post_id.is_some_and(|id| post_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn link_to_post(&self, post_id: Uuid, ids: &[Uuid]) -> Result<u64, RepoError> {
        let mut touched = 0;
        for attachment in self.rows.lock().unwrap().iter_mut() {
            if ids.contains(&attachment.id) && !attachment.in_use {
                attachment.in_use = true;
                attachment.post_id = Some(post_id);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[derive(Default)]
pub struct MemoryDevices {
    pub rows: Mutex<Vec<Device>>,
}

#[async_trait]
impl BaseRepository<Device, Uuid> for MemoryDevices {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Device>, RepoError> {
        Ok(self.rows.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn save(&self, device: Device) -> Result<Device, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|d| d.id != device.id);
        rows.push(device.clone());
        Ok(device)
    }
}

#[async_trait]
impl DeviceRepository for MemoryDevices {
    async fn delete_created_until(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|d| d.created_at > cutoff);
        Ok((before - rows.len()) as u64)
    }
}

/// Blob store over a shared map. `fail_writes` makes every staged write fail.
#[derive(Default)]
pub struct MemoryBlobs {
    pub files: std::sync::Arc<Mutex<HashMap<String, Vec<u8>>>>,
    pub fail_writes: bool,
    pub discarded: std::sync::Arc<Mutex<usize>>,
}

impl MemoryBlobs {
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

struct MemoryStaged {
    buffer: Vec<u8>,
    fail: bool,
    files: std::sync::Arc<Mutex<HashMap<String, Vec<u8>>>>,
    discarded: std::sync::Arc<Mutex<usize>>,
}

#[async_trait]
impl StagedBlob for MemoryStaged {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), BlobError> {
        if self.fail {
            return Err(BlobError::Io("disk full".to_string()));
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn commit(self: Box<Self>, path: &str) -> Result<CommitOutcome, BlobError> {
        let MemoryStaged {
            buffer,
            files,
            discarded,
            ..
        } = *self;
        let mut files = files.lock().unwrap();
        if files.contains_key(path) {
            *discarded.lock().unwrap() += 1;
            return Ok(CommitOutcome::AlreadyPresent);
        }
        files.insert(path.to_string(), buffer);
        Ok(CommitOutcome::Stored)
    }

    async fn discard(self: Box<Self>) -> Result<(), BlobError> {
        *self.discarded.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn stage(&self) -> Result<Box<dyn StagedBlob>, BlobError> {
        Ok(Box::new(MemoryStaged {
            buffer: Vec::new(),
            fail: self.fail_writes,
            files: self.files.clone(),
            discarded: self.discarded.clone(),
        }))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        self.get(path)
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }

    async fn open(&self, path: &str) -> Result<BlobReader, BlobError> {
        let data = self.read(path).await?;
        Ok(BlobReader {
            size: data.len() as u64,
            stream: futures::stream::once(async move { Ok(bytes::Bytes::from(data)) }).boxed(),
        })
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }
}

/// Queue that records jobs instead of running them.
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<Job>>,
    pub reject: bool,
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.reject {
            return Err(JobQueueError::QueueFull);
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.jobs.lock().unwrap().len(),
            ..QueueStats::default()
        })
    }
}
