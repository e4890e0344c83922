//! Batch job dispatch
//!
//! [`JobDispatcher`] is the queue seam: the coordinator enqueues one
//! [`BatchJob`] per batch and does not wait for it. [`LocalDispatcher`] runs jobs
//! on the tokio runtime with a bounded number in flight and re-runs failed jobs
//! up to a configured number of attempts. A re-run resumes after the playlists
//! the failed attempt already counted.

use super::worker::{BatchOutcome, BatchWorker};
use crate::domain::ids::ExportId;
use crate::domain::{Playlist, Result};
use crate::log_retry_attempt;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// One unit of work: a batch of playlists belonging to an export
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Export the batch belongs to
    pub export_id: ExportId,
    /// Folder name of the export
    pub folder_name: String,
    /// Position of the batch, for logging only
    pub batch_index: usize,
    /// Playlists to export, processed in order
    pub playlists: Vec<Playlist>,
}

/// Enqueues batch jobs for asynchronous, at-least-once execution
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Enqueue `job`. Returns once the job is accepted, not when it has run.
    async fn dispatch(&self, job: BatchJob) -> Result<()>;
}

/// Outcome counts of the jobs awaited by [`LocalDispatcher::drain`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs that ran to completion
    pub succeeded: usize,
    /// Jobs abandoned after their last attempt
    pub failed: usize,
    /// Archives published by jobs that completed an export
    pub archives: Vec<PathBuf>,
}

impl DispatchReport {
    /// Whether every job succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Dispatcher settings
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Jobs allowed to run concurrently
    pub max_concurrent: usize,
    /// Attempts per job, including the first
    pub max_attempts: usize,
    /// Pause between attempts of the same job
    pub retry_delay: Duration,
}

/// Runs batch jobs as tokio tasks in this process
pub struct LocalDispatcher {
    worker: Arc<BatchWorker>,
    permits: Arc<Semaphore>,
    settings: DispatchSettings,
    tasks: Mutex<JoinSet<Result<BatchOutcome>>>,
}

impl LocalDispatcher {
    /// Create a dispatcher running jobs on `worker`
    pub fn new(worker: Arc<BatchWorker>, settings: DispatchSettings) -> Self {
        Self {
            worker,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            settings,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for every dispatched job to finish
    ///
    /// Dropping the returned future aborts the jobs it was waiting on.
    pub async fn drain(&self) -> DispatchReport {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().await);
        let mut report = DispatchReport::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    report.succeeded += 1;
                    if let BatchOutcome::Finalized { archive, .. } = outcome {
                        report.archives.push(archive.path);
                    }
                }
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Batch task panicked or was cancelled");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[async_trait]
impl JobDispatcher for LocalDispatcher {
    async fn dispatch(&self, job: BatchJob) -> Result<()> {
        let worker = Arc::clone(&self.worker);
        let permits = Arc::clone(&self.permits);
        let settings = self.settings;

        tracing::debug!(
            export_id = %job.export_id,
            batch_index = job.batch_index,
            "Dispatching batch"
        );

        self.tasks.lock().await.spawn(async move {
            let _permit = permits.acquire_owned().await.map_err(|e| {
                crate::domain::ExportError::InvariantViolation(format!(
                    "dispatch semaphore closed: {e}"
                ))
            })?;
            run_with_retries(&worker, &job, settings).await
        });

        Ok(())
    }
}

async fn run_with_retries(
    worker: &BatchWorker,
    job: &BatchJob,
    settings: DispatchSettings,
) -> Result<BatchOutcome> {
    let max_attempts = settings.max_attempts.max(1);
    let mut attempt = 0;
    let mut counted = 0;

    loop {
        attempt += 1;
        match worker.resume(job, &mut counted).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt < max_attempts => {
                log_retry_attempt!(attempt, max_attempts, e);
                tokio::time::sleep(settings.retry_delay).await;
            }
            Err(e) => {
                tracing::error!(
                    export_id = %job.export_id,
                    batch_index = job.batch_index,
                    attempts = attempt,
                    error = %e,
                    "Batch abandoned"
                );
                return Err(e);
            }
        }
    }
}
