use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Attachment, Device, Post};
use crate::error::RepoError;
use crate::filter::PostQuery;

/// Generic repository trait defining the shared persistence operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;
}

/// One page of a post listing.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// Number of posts matching the query before slicing.
    pub total: u64,
}

/// Number of live posts whose `event_time` falls in `year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Like `find_by_id`, but soft-deleted posts are treated as missing.
    async fn find_live(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Run a listing query: `event_time` descending, then `id` descending.
    async fn query(&self, query: &PostQuery) -> Result<PostPage, RepoError>;

    /// Live post counts per calendar year, newest year first.
    async fn year_counts(&self) -> Result<Vec<YearCount>, RepoError>;
}

/// Attachment repository.
#[async_trait]
pub trait AttachmentRepository: BaseRepository<Attachment, Uuid> {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError>;

    async fn find_by_post_ids(&self, post_ids: &[Uuid]) -> Result<Vec<Attachment>, RepoError>;

    /// Mark the given attachments in use and owned by `post_id`.
    /// Only unclaimed rows are touched; returns how many were.
    async fn link_to_post(&self, post_id: Uuid, ids: &[Uuid]) -> Result<u64, RepoError>;
}

/// Remembered-device repository.
#[async_trait]
pub trait DeviceRepository: BaseRepository<Device, Uuid> {
    /// Delete devices created at or before `cutoff`.
    async fn delete_created_until(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError>;
}
