//! Download engine for concurrent file downloads.
//!
//! The `DownloadEngine` runs a fixed list of [`DownloadTask`]s through a
//! semaphore-bounded worker pool. Each task ends in exactly one
//! [`TaskStatus`]; a failing task never stops its siblings.
//!
//! # Example
//!
//! ```no_run
//! use indicatif::ProgressBar;
//! use tokio_util::sync::CancellationToken;
//! use tnm_core::download::{DownloadEngine, HttpClient, RetryPolicy};
//!
//! # async fn example(tasks: Vec<tnm_core::download::DownloadTask>) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(5, RetryPolicy::default())?;
//! let report = engine
//!     .run(tasks, &HttpClient::new(), &ProgressBar::hidden(), &CancellationToken::new())
//!     .await?;
//! println!("Completed: {}, Failed: {}", report.completed(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::constants::{MAX_WORKERS, MIN_WORKERS};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::task::DownloadTask;
use super::{DownloadError, HttpClient};

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A destination directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Terminal state of one task.
#[derive(Debug)]
pub enum TaskStatus {
    /// The file was written completely.
    Completed {
        /// Bytes written.
        bytes: u64,
    },
    /// The download failed after all permitted attempts.
    Failed {
        /// The last error seen.
        error: DownloadError,
    },
    /// The run was interrupted before the task finished.
    Abandoned,
}

/// A task together with how it ended.
#[derive(Debug)]
pub struct TaskOutcome {
    /// The task that ran.
    pub task: DownloadTask,
    /// How it ended.
    pub status: TaskStatus,
    /// Attempts made (0 when never started).
    pub attempts: u32,
}

/// Results of one [`DownloadEngine::run`].
#[derive(Debug, Default)]
pub struct DownloadReport {
    outcomes: Vec<TaskOutcome>,
    peak_concurrency: usize,
    interrupted: bool,
}

impl DownloadReport {
    /// Every outcome, one per submitted task, in submission order.
    #[must_use]
    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// Number of tasks that completed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Completed { .. }))
    }

    /// Number of tasks that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Failed { .. }))
    }

    /// Number of tasks abandoned by an interrupt.
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.count(|s| matches!(s, TaskStatus::Abandoned))
    }

    /// Total bytes written by completed tasks.
    #[must_use]
    pub fn bytes_downloaded(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                TaskStatus::Completed { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Failed tasks with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&DownloadTask, &DownloadError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            TaskStatus::Failed { error } => Some((&o.task, error)),
            _ => None,
        })
    }

    /// True when at least one task failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Most downloads observed running at the same moment.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak_concurrency
    }

    /// True when the run was cancelled.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// True when every task completed and nothing was interrupted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.completed() == self.outcomes.len()
    }

    fn count(&self, pred: impl Fn(&TaskStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Counts running downloads and remembers the maximum.
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightSlot {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightSlot(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightSlot(Arc<InFlight>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Download engine with a bounded worker pool.
///
/// # Concurrency Model
///
/// - Each download runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each download
/// - Permits are released automatically when downloads complete (RAII)
/// - Cancelling the token stops submission and abandons running tasks
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured worker count.
    workers: usize,
    /// Retry policy for failed downloads.
    retry_policy: RetryPolicy,
}

impl DownloadEngine {
    /// Creates an engine running at most `workers` downloads at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkers`] if the value is outside
    /// the valid range (1-64).
    ///
    /// # Example
    ///
    /// ```
    /// use tnm_core::download::{DownloadEngine, RetryPolicy};
    ///
    /// let engine = DownloadEngine::new(5, RetryPolicy::default()).unwrap();
    /// assert_eq!(engine.workers(), 5);
    /// assert!(DownloadEngine::new(0, RetryPolicy::default()).is_err());
    /// ```
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(workers: usize, retry_policy: RetryPolicy) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(EngineError::InvalidWorkers { value: workers });
        }

        debug!(
            workers,
            max_attempts = retry_policy.max_attempts(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            retry_policy,
        })
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Downloads every task and returns one outcome per task.
    ///
    /// Destination directories are created before anything is fetched.
    /// `progress` advances once per finished task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutputDir`] if a destination directory cannot
    /// be created, or [`EngineError::SemaphoreClosed`] if the semaphore is
    /// closed.
    ///
    /// Note: Individual download failures do NOT cause this method to error.
    /// They are recorded in the report.
    #[instrument(skip_all, fields(tasks = tasks.len(), workers = self.workers))]
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        client: &HttpClient,
        progress: &ProgressBar,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport, EngineError> {
        create_destination_dirs(&tasks).await?;
        progress.set_length(tasks.len() as u64);

        let in_flight = Arc::new(InFlight::default());
        let mut running: Vec<(DownloadTask, JoinHandle<(TaskStatus, u32)>)> = Vec::new();
        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut skipped = Vec::new();
        let mut pending = tasks.into_iter();

        info!("starting downloads");

        while let Some(task) = pending.next() {
            // Acquire semaphore permit (waits while every worker is busy)
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                permit = self.semaphore.clone().acquire_owned() => {
                    Some(permit.map_err(|_| EngineError::SemaphoreClosed)?)
                }
            };
            let Some(permit) = permit else {
                debug!("cancelled, not submitting remaining tasks");
                skipped.extend(std::iter::once(task).chain(pending.by_ref()).map(abandoned));
                break;
            };

            debug!(product_id = %task.product.id, "submitting download");

            let client = client.clone();
            let progress = progress.clone();
            let cancel = cancel.clone();
            let in_flight = Arc::clone(&in_flight);
            let retry_policy = self.retry_policy.clone();
            let url = task.product.download_url.clone();
            let destination = task.destination.clone();

            let handle = tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;
                let _slot = in_flight.enter();

                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => (TaskStatus::Abandoned, 0),
                    (result, attempts) = download_with_retry(&client, &url, &destination, &retry_policy) => {
                        match result {
                            Ok(bytes) => (TaskStatus::Completed { bytes }, attempts),
                            Err(error) => (TaskStatus::Failed { error }, attempts),
                        }
                    }
                };
                progress.inc(1);
                result
            });
            running.push((task, handle));
        }

        debug!(task_count = running.len(), "waiting for downloads to complete");

        for (task, handle) in running {
            let (status, attempts) = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(product_id = %task.product.id, error = %e, "download task panicked");
                    let url = task.product.download_url.clone();
                    (TaskStatus::Failed { error: DownloadError::WorkerPanicked { url } }, 1)
                }
            };
            match &status {
                TaskStatus::Completed { bytes } => info!(
                    product_id = %task.product.id,
                    path = %task.destination.display(),
                    bytes,
                    "download completed"
                ),
                TaskStatus::Failed { error } => warn!(
                    product_id = %task.product.id,
                    url = %task.product.download_url,
                    error = %error,
                    attempts,
                    "download failed"
                ),
                TaskStatus::Abandoned => debug!(product_id = %task.product.id, "download abandoned"),
            }
            outcomes.push(TaskOutcome {
                task,
                status,
                attempts,
            });
        }

        outcomes.append(&mut skipped);
        let report = DownloadReport {
            outcomes,
            peak_concurrency: in_flight.peak(),
            interrupted: cancel.is_cancelled(),
        };
        info!(
            completed = report.completed(),
            failed = report.failed(),
            abandoned = report.abandoned(),
            peak_concurrency = report.peak_concurrency(),
            "downloads finished"
        );
        Ok(report)
    }
}

fn abandoned(task: DownloadTask) -> TaskOutcome {
    TaskOutcome {
        task,
        status: TaskStatus::Abandoned,
        attempts: 0,
    }
}

async fn create_destination_dirs(tasks: &[DownloadTask]) -> Result<(), EngineError> {
    let dirs: BTreeSet<&Path> = tasks
        .iter()
        .filter_map(|t| t.destination.parent())
        .filter(|d| !d.as_os_str().is_empty())
        .collect();
    for dir in dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: dir.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Downloads with retry; returns the final result and the attempts made.
async fn download_with_retry(
    client: &HttpClient,
    url: &str,
    destination: &Path,
    policy: &RetryPolicy,
) -> (Result<u64, DownloadError>, u32) {
    let mut attempt = 1;
    loop {
        match client.download(url, destination).await {
            Ok(bytes) => return (Ok(bytes), attempt),
            Err(error) => match policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry { delay, attempt: next } => {
                    debug!(url, error = %error, delay_ms = delay.as_millis(), "retrying download");
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url, reason, "not retrying");
                    return (Err(error), attempt);
                }
            },
        }
    }
}
