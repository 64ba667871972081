//! Cron-style maintenance using tokio-cron-scheduler.

use std::future::Future;
use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use daylog_core::ports::JobQueue;
use daylog_core::services::DeviceRegistry;

use crate::state::AppState;

/// Daily, 03:00.
pub const DEVICE_PURGE_SCHEDULE: &str = "0 0 3 * * *";
/// Every 15 minutes.
pub const QUEUE_STATS_SCHEDULE: &str = "0 */15 * * * *";
/// Hourly, at half past.
pub const LIMITER_SHRINK_SCHEDULE: &str = "0 30 * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Running maintenance jobs: expired device purge, thumbnail queue stats,
/// and rate limiter compaction.
pub struct Housekeeping {
    inner: JobScheduler,
}

impl Housekeeping {
    /// Register every job and start ticking. Returns `None` when disabled.
    pub async fn start(
        config: &SchedulerConfig,
        state: &AppState,
    ) -> Result<Option<Self>, JobSchedulerError> {
        if !config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(None);
        }

        let inner = JobScheduler::new().await?;

        let devices = state.devices.clone();
        add(&inner, DEVICE_PURGE_SCHEDULE, move || purge_devices(devices.clone())).await?;

        let jobs = state.jobs.clone();
        add(&inner, QUEUE_STATS_SCHEDULE, move || log_queue_stats(jobs.clone())).await?;

        let limiter = state.login_limiter.clone();
        add(&inner, LIMITER_SHRINK_SCHEDULE, move || {
            let limiter = limiter.clone();
            async move {
                limiter.shrink();
                tracing::debug!("Login rate limiter compacted");
            }
        })
        .await?;

        inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(Some(Self { inner }))
    }

    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

async fn add<F, Fut>(
    scheduler: &JobScheduler,
    schedule: &str,
    task: F,
) -> Result<uuid::Uuid, JobSchedulerError>
where
    F: Fn() -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let task = task.clone();
        Box::pin(async move {
            task().await;
        })
    })?;

    let id = scheduler.add(job).await?;
    tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
    Ok(id)
}

pub async fn purge_devices(devices: Arc<DeviceRegistry>) {
    if let Err(e) = devices.purge_expired().await {
        tracing::error!(error = %e, "Device purge failed");
    }
}

pub async fn log_queue_stats(jobs: Arc<dyn JobQueue>) {
    match jobs.stats().await {
        Ok(stats) => tracing::info!(
            pending = stats.pending,
            processing = stats.processing,
            completed = stats.completed,
            failed = stats.failed,
            "Thumbnail queue stats"
        ),
        Err(e) => tracing::warn!(error = %e, "Thumbnail queue stats unavailable"),
    }
}
