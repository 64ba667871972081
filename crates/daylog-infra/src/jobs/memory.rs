//! In-memory job queue implementation.
//!
//! Jobs are held in a bounded channel and processed by local workers.
//! Jobs are lost on server restart; a lost thumbnail job only means a
//! missing thumbnail.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use daylog_core::ports::{
    Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats, job_handler,
};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of pending jobs.
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 256,
            workers: 2,
        }
    }
}

/// In-memory job queue.
pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

#[derive(Default)]
struct JobStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(1));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        // Counted before sending so a fast worker never sees it negative.
        let pending = self.stats.pending.fetch_add(1, Ordering::Relaxed) + 1;

        if let Err(e) = self.job_sender.try_send(job) {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => JobQueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    JobQueueError::EnqueueError("queue closed".to_string())
                }
            });
        }

        tracing::debug!(pending, "Job enqueued");

        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        for worker_id in 0..self.config.workers.max(1) {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let stats = self.stats.clone();
            let sender = self.job_sender.clone();

            tokio::spawn(async move {
                tracing::info!(worker = worker_id, "Job worker started");

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!(worker = worker_id, "Job worker shutting down");
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Processing job"
                    );

                    job.attempts += 1;
                    let result = handler(job.clone()).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                max_attempts = job.max_attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            // Back off, then re-enqueue without blocking this worker.
                            stats.pending.fetch_add(1, Ordering::Relaxed);
                            let sender = sender.clone();
                            let stats = stats.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(tokio::time::Duration::from_millis(
                                    100 * job.attempts as u64,
                                ))
                                .await;
                                if let Err(e) = sender.send(job).await {
                                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                                    stats.failed.fetch_add(1, Ordering::Relaxed);
                                    tracing::error!(error = %e, "Failed to re-enqueue job for retry");
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}

/// Dispatches jobs to handlers by `job_type`.
#[derive(Default)]
pub struct JobRouter {
    routes: HashMap<String, JobHandler>,
}

impl JobRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, job_type: impl Into<String>, handler: JobHandler) -> Self {
        self.routes.insert(job_type.into(), handler);
        self
    }

    /// Collapse the routes into a single handler for a queue.
    pub fn into_handler(self) -> JobHandler {
        let routes = Arc::new(self.routes);
        job_handler(move |job: Job| {
            let routes = routes.clone();
            async move {
                match routes.get(&job.job_type) {
                    Some(handler) => handler(job).await,
                    None => JobResult::Failed(format!("no handler for job type '{}'", job.job_type)),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    async fn wait_for(queue: &InMemoryJobQueue, done: impl Fn(&QueueStats) -> bool) -> QueueStats {
        for _ in 0..200 {
            let stats = queue.stats().await.unwrap();
            if done(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("queue did not settle: {:?}", queue.stats().await.unwrap());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 2,
            workers: 1,
        });

        queue.enqueue(Job::new("a", serde_json::json!({}))).await.unwrap();
        queue.enqueue(Job::new("a", serde_json::json!({}))).await.unwrap();
        let third = queue.enqueue(Job::new("a", serde_json::json!({}))).await;

        assert!(matches!(third, Err(JobQueueError::QueueFull)));
        assert_eq!(queue.stats().await.unwrap().pending, 2);
    }

    #[tokio::test]
    async fn test_jobs_are_processed() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig::default());
        let handler = job_handler(|_job| async { JobResult::Success });
        queue.start_worker(handler).await.unwrap();

        for _ in 0..5 {
            queue.enqueue(Job::new("a", serde_json::json!({}))).await.unwrap();
        }

        let stats = wait_for(&queue, |s| s.completed == 5).await;
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_retry_until_max_attempts() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let handler = job_handler(move |_job| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { JobResult::Retry("blob busy".to_string()) }
        });
        queue.start_worker(handler).await.unwrap();

        queue
            .enqueue(Job::new("a", serde_json::json!({})).with_max_attempts(3))
            .await
            .unwrap();

        let stats = wait_for(&queue, |s| s.failed == 1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_router_dispatches_by_type() {
        let queue = InMemoryJobQueue::new(InMemoryJobQueueConfig::default());
        let ok = job_handler(|_job| async { JobResult::Success });
        queue
            .start_worker(JobRouter::new().route("known", ok).into_handler())
            .await
            .unwrap();

        queue.enqueue(Job::new("known", serde_json::json!({}))).await.unwrap();
        queue.enqueue(Job::new("unknown", serde_json::json!({}))).await.unwrap();

        let stats = wait_for(&queue, |s| s.completed + s.failed == 2).await;
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
    }
}
