//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::DbErr;

use daylog_core::ports::{
    AttachmentRepository, AuthError, BlobError, BlobStore, Clock, DeviceRepository, JobQueue,
    JobQueueError, PasswordService, PostRepository, SessionCodec, SystemClock,
};
use daylog_core::services::{
    AttachmentIngestor, AuthGate, ContentFilterEngine, DeviceRegistry, Journal, THUMBNAIL_JOB,
};
use daylog_infra::{
    Argon2PasswordService, FsBlobStore, InMemoryJobQueue, InMemoryJobQueueConfig,
    InMemoryRateLimiter, JobRouter, JwtSessionCodec, RateLimitConfig, SessionCodecConfig,
    SqliteAttachmentRepository, SqliteDeviceRepository, SqlitePostRepository, ThumbnailConfig,
    ThumbnailGenerator, connect, thumbnail_job_handler,
};

use crate::config::{AppConfig, AuthSecret};
use crate::middleware::CookieSettings;
use crate::views::Views;

/// Issuer claim stamped into session cookies.
const SESSION_ISSUER: &str = "daylog";

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database unavailable: {0}")]
    Database(#[from] DbErr),

    #[error("Upload directory unusable: {0}")]
    Blobs(#[from] BlobError),

    #[error("Login secret could not be prepared: {0}")]
    Secret(#[from] AuthError),

    #[error("Job queue failed to start: {0}")]
    Jobs(#[from] JobQueueError),

    #[error("Templates failed to compile: {0}")]
    Templates(#[from] minijinja::Error),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub sessions: Arc<dyn SessionCodec>,
    pub listing: Arc<ContentFilterEngine>,
    pub journal: Arc<Journal>,
    pub ingestor: Arc<AttachmentIngestor>,
    pub devices: Arc<DeviceRegistry>,
    pub blobs: Arc<dyn BlobStore>,
    pub jobs: Arc<dyn JobQueue>,
    pub login_limiter: Arc<InMemoryRateLimiter>,
    pub views: Arc<Views>,
    pub cookies: CookieSettings,
}

impl AppState {
    /// Build the application state against the real clock.
    pub async fn build(config: &AppConfig) -> Result<Self, StartupError> {
        Self::build_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Connect, migrate, and wire every service. Starts the thumbnail
    /// workers as a side effect.
    pub async fn build_with_clock(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let db = Arc::new(connect(&config.database).await?);
        Migrator::up(db.as_ref(), None).await?;
        tracing::info!("Migrations applied");

        let posts: Arc<dyn PostRepository> = Arc::new(SqlitePostRepository::new(db.clone()));
        let attachments: Arc<dyn AttachmentRepository> =
            Arc::new(SqliteAttachmentRepository::new(db.clone()));
        let device_repo: Arc<dyn DeviceRepository> =
            Arc::new(SqliteDeviceRepository::new(db.clone()));

        let blobs: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::open(config.upload_dir.clone()).await?);

        let jobs: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: config.job_queue_max_size,
            workers: config.job_queue_workers,
        }));
        let generator = Arc::new(ThumbnailGenerator::new(ThumbnailConfig {
            size: config.thumbnail_size,
            ..ThumbnailConfig::default()
        }));
        let router =
            JobRouter::new().route(THUMBNAIL_JOB, thumbnail_job_handler(blobs.clone(), generator));
        jobs.start_worker(router.into_handler()).await?;

        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        let secret_hash = match &config.auth_secret {
            AuthSecret::Hashed(hash) => hash.clone(),
            AuthSecret::Plain(secret) => passwords.hash(secret)?,
        };
        let gate = Arc::new(AuthGate::new(
            config.policy,
            passwords,
            secret_hash,
            clock.clone(),
        ));

        let sessions: Arc<dyn SessionCodec> = Arc::new(JwtSessionCodec::new(SessionCodecConfig {
            secret: config.session_key.clone(),
            issuer: SESSION_ISSUER.to_string(),
        }));

        let login_limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: config.login_rate_limit_per_minute,
            window: Duration::from_secs(60),
        }));

        let state = Self {
            gate,
            sessions,
            listing: Arc::new(ContentFilterEngine::new(posts.clone())),
            journal: Arc::new(Journal::new(posts, attachments.clone(), clock.clone())),
            ingestor: Arc::new(AttachmentIngestor::new(
                blobs.clone(),
                attachments,
                jobs.clone(),
                config.max_upload_bytes,
            )),
            devices: Arc::new(DeviceRegistry::new(device_repo, clock)),
            blobs,
            jobs,
            login_limiter,
            views: Arc::new(Views::new()?),
            cookies: CookieSettings {
                secure: config.secure_cookies,
            },
        };

        tracing::info!(
            upload_dir = %config.upload_dir.display(),
            workers = config.job_queue_workers,
            "Application state initialized"
        );
        Ok(state)
    }
}
