//! Preprocessing jobs.
//!
//! An upload becomes a job identified by a random URL-safe token. Jobs are
//! queued to a single worker task, so at most one job converts at a time;
//! status and progress stay in memory for the life of the process.

mod progress;
mod runner;
mod tracker;
mod upload;

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::extract::ExtractionError;
use crate::report::ReportTable;

pub use progress::{Progress, ProgressEvent};
pub use runner::{preprocess, run_worker, JobRequest, WorkerConfig};
pub use tracker::{JobSnapshot, JobTracker};
pub use upload::StagedUpload;

/// Job identifier.
pub type JobId = String;

/// Random bytes behind a job id.
const JOB_ID_BYTES: usize = 32;

/// Generate a URL-safe job id.
pub fn new_job_id() -> JobId {
    let mut bytes = [0u8; JOB_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lifecycle of a job.
#[derive(Debug, Clone)]
pub enum JobStatus {
    Queued,
    Running,
    Completed(Arc<ReportTable>),
    Failed(String),
}

impl JobStatus {
    /// Short state name used by the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed(_) => "complete",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// Errors that end a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Error processing file {file}: {source}")]
    File {
        file: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Preprocessing did not output anything useful")]
    NoOutput,

    #[error("Job queue is closed")]
    QueueClosed,
}

/// Entry point for submitting jobs and observing them.
#[derive(Clone)]
pub struct JobManager {
    tracker: JobTracker,
    queue: mpsc::UnboundedSender<JobRequest>,
}

impl JobManager {
    /// Spawn the worker task. Must be called inside a tokio runtime.
    pub fn start(config: WorkerConfig) -> Self {
        let tracker = JobTracker::new();
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(tracker.clone(), config, rx));
        Self { tracker, queue }
    }

    /// Register and queue a job for the staged files.
    pub async fn submit(&self, upload: StagedUpload) -> Result<JobId, JobError> {
        let job_id = new_job_id();
        self.tracker.register(&job_id, upload.len()).await;

        let request = JobRequest {
            job_id: job_id.clone(),
            upload,
        };
        if self.queue.send(request).is_err() {
            self.tracker
                .fail(&job_id, JobError::QueueClosed.to_string())
                .await;
            return Err(JobError::QueueClosed);
        }
        Ok(job_id)
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::TextExtractor;
    use std::time::Duration;

    #[test]
    fn test_job_id_is_url_safe() {
        let id = new_job_id();
        assert_eq!(id.len(), 43);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(id, new_job_id());
    }

    #[tokio::test]
    async fn test_submit_runs_job_to_completion() {
        let manager = JobManager::start(WorkerConfig::new(TextExtractor::new(), false));
        let mut upload = StagedUpload::new(None).unwrap();
        upload.add_file("letter.txt", b"Dear colleague").await.unwrap();

        let job_id = manager.submit(upload).await.unwrap();

        let mut status = None;
        for _ in 0..100 {
            status = manager.tracker().status(&job_id).await;
            if status.as_ref().map(|s| s.is_finished()).unwrap_or(false) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        match status {
            Some(JobStatus::Completed(table)) => {
                assert_eq!(table.to_csv(), "report\nDear colleague\n")
            }
            other => panic!("job did not complete: {:?}", other),
        }
    }
}
