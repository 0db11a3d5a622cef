//! In-memory job table and progress fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use super::progress::{Progress, ProgressEvent};
use super::{JobId, JobStatus};
use crate::report::ReportTable;

/// Buffered events per subscriber before slow clients start missing some.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct JobEntry {
    status: JobStatus,
    progress: Progress,
    seq: u64,
}

#[derive(Debug, Default)]
struct Jobs {
    entries: HashMap<JobId, JobEntry>,
    next_seq: u64,
}

/// A job as shown on the index page.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: Progress,
}

/// Tracks job status and progress and broadcasts every change.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<Jobs>>,
    events: broadcast::Sender<ProgressEvent>,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            jobs: Arc::new(RwLock::new(Jobs::default())),
            events,
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ProgressEvent) {
        // No subscribers is fine: nobody is watching.
        let _ = self.events.send(event);
    }

    /// Register a queued job with `total` files.
    pub async fn register(&self, job_id: &str, total: usize) {
        let progress = Progress::new(0, total, true);
        {
            let mut jobs = self.jobs.write().await;
            let seq = jobs.next_seq;
            jobs.next_seq += 1;
            jobs.entries.insert(
                job_id.to_string(),
                JobEntry {
                    status: JobStatus::Queued,
                    progress,
                    seq,
                },
            );
        }
        tracing::info!(job_id = %job_id, total, "Job queued");
        self.emit(ProgressEvent::update(job_id, progress));
    }

    /// Store and broadcast new progress for a job.
    pub async fn update_progress(&self, job_id: &str, progress: Progress) {
        if let Some(entry) = self.jobs.write().await.entries.get_mut(job_id) {
            entry.progress = progress;
        }
        tracing::debug!(
            job_id = %job_id,
            completed = progress.completed,
            total = progress.total,
            success = progress.success,
            "Progress"
        );
        self.emit(ProgressEvent::update(job_id, progress));
    }

    pub async fn mark_running(&self, job_id: &str) {
        self.set_status(job_id, JobStatus::Running).await;
    }

    /// Store the finished table and announce completion.
    pub async fn complete(&self, job_id: &str, table: ReportTable) {
        tracing::info!(job_id = %job_id, rows = table.len(), "Job complete");
        self.set_status(job_id, JobStatus::Completed(Arc::new(table)))
            .await;
        self.emit(ProgressEvent::Complete {
            job_id: job_id.to_string(),
        });
    }

    /// Mark the job failed and announce it.
    pub async fn fail(&self, job_id: &str, reason: String) {
        tracing::warn!(job_id = %job_id, reason = %reason, "Job failed");
        {
            let mut jobs = self.jobs.write().await;
            if let Some(entry) = jobs.entries.get_mut(job_id) {
                entry.status = JobStatus::Failed(reason);
                entry.progress.success = false;
            }
        }
        self.emit(ProgressEvent::Failed {
            job_id: job_id.to_string(),
        });
    }

    async fn set_status(&self, job_id: &str, status: JobStatus) {
        if let Some(entry) = self.jobs.write().await.entries.get_mut(job_id) {
            entry.status = status;
        }
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs
            .read()
            .await
            .entries
            .get(job_id)
            .map(|e| e.status.clone())
    }

    pub async fn progress(&self, job_id: &str) -> Option<Progress> {
        self.jobs.read().await.entries.get(job_id).map(|e| e.progress)
    }

    /// All jobs in submission order.
    pub async fn snapshot(&self) -> Vec<JobSnapshot> {
        let jobs = self.jobs.read().await;
        let mut entries: Vec<(&JobId, &JobEntry)> = jobs.entries.iter().collect();
        entries.sort_by_key(|(_, e)| e.seq);
        entries
            .into_iter()
            .map(|(id, e)| JobSnapshot {
                job_id: id.clone(),
                status: e.status.clone(),
                progress: e.progress,
            })
            .collect()
    }

    /// Current progress of every job as update events, for late subscribers.
    pub async fn replay(&self) -> Vec<ProgressEvent> {
        self.snapshot()
            .await
            .into_iter()
            .map(|job| match job.status {
                JobStatus::Completed(_) => ProgressEvent::Complete { job_id: job.job_id },
                JobStatus::Failed(_) => ProgressEvent::Failed { job_id: job.job_id },
                _ => ProgressEvent::update(&job.job_id, job.progress),
            })
            .collect()
    }
}
