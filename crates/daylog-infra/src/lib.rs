//! # Daylog Infrastructure
//!
//! Concrete implementations of the ports defined in `daylog-core`:
//! SQLite repositories, the filesystem blob store, the in-memory job
//! queue, thumbnail rendering, session signing and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `auth` - JWT session cookies + Argon2 secret verification
//! - `rate-limit` - Rate limiting via governor
//! - `thumbnails` - Thumbnail rendering via image

pub mod blob;
pub mod database;
pub mod jobs;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "thumbnails")]
pub mod thumbnail;

pub use blob::FsBlobStore;
pub use database::{
    DatabaseConfig, SqliteAttachmentRepository, SqliteDeviceRepository, SqlitePostRepository,
    connect,
};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig, JobRouter};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtSessionCodec, SessionCodecConfig};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

#[cfg(feature = "thumbnails")]
pub use thumbnail::{ThumbnailConfig, ThumbnailGenerator, thumbnail_job_handler};
