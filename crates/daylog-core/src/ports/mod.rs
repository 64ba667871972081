//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod blob;
mod clock;
mod job_queue;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, SessionCodec};
pub use blob::{BlobError, BlobReader, BlobStore, ByteStream, CommitOutcome, StagedBlob};
pub use clock::{Clock, FixedClock, SystemClock};
pub use job_queue::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats, job_handler};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    AttachmentRepository, BaseRepository, DeviceRepository, PostPage, PostRepository, YearCount,
};
