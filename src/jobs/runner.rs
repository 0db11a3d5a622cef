//! The preprocessing worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use super::progress::Progress;
use super::tracker::JobTracker;
use super::upload::StagedUpload;
use super::{JobError, JobId};
use crate::extract::{ExtractionError, TextExtractor};
use crate::report::ReportTable;

/// A queued job.
#[derive(Debug)]
pub struct JobRequest {
    pub job_id: JobId,
    pub upload: StagedUpload,
}

/// How the worker converts files.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub extractor: Arc<TextExtractor>,
    /// Files converted concurrently within one job.
    pub concurrency: usize,
}

impl WorkerConfig {
    pub fn new(extractor: TextExtractor, parallel: bool) -> Self {
        let concurrency = if parallel {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            1
        };
        Self {
            extractor: Arc::new(extractor),
            concurrency,
        }
    }
}

/// Process queued jobs one at a time until the queue closes.
pub async fn run_worker(
    tracker: JobTracker,
    config: WorkerConfig,
    mut queue: mpsc::UnboundedReceiver<JobRequest>,
) {
    while let Some(JobRequest { job_id, upload }) = queue.recv().await {
        tracker.mark_running(&job_id).await;
        tracing::info!(job_id = %job_id, files = upload.len(), "Preprocessing job");

        match preprocess(&tracker, &config, &job_id, &upload).await {
            Ok(table) => tracker.complete(&job_id, table).await,
            Err(e) => tracker.fail(&job_id, e.to_string()).await,
        }
        // Dropping the upload removes whatever files are left.
        drop(upload);
    }
    tracing::debug!("Job queue closed, worker exiting");
}

/// Convert every file of an upload and merge the results.
///
/// Results are consumed in upload order even when files are converted
/// concurrently. Each finished file is deleted and reported; the first
/// failure stops the job with progress `(i, n, false)`.
pub async fn preprocess(
    tracker: &JobTracker,
    config: &WorkerConfig,
    job_id: &str,
    upload: &StagedUpload,
) -> Result<ReportTable, JobError> {
    let total = upload.len();
    let files: Vec<PathBuf> = upload.files().to_vec();

    let mut results = stream::iter(files.into_iter().map(|path| {
        let extractor = config.extractor.clone();
        async move {
            let target = path.clone();
            let result = tokio::task::spawn_blocking(move || extractor.extract(&target))
                .await
                .unwrap_or_else(|e| {
                    Err(ExtractionError::Io(std::io::Error::other(format!(
                        "conversion task failed: {}",
                        e
                    ))))
                });
            (path, result)
        }
    }))
    .buffered(config.concurrency.max(1));

    let mut merged = Vec::with_capacity(total);
    let mut completed = 0;

    while let Some((path, result)) = results.next().await {
        remove_upload(&path).await;

        match result {
            Ok(table) => merged.push(table),
            Err(ExtractionError::UnsupportedFileType(_)) => {
                tracing::warn!(job_id = %job_id, file = %path.display(), "Unsupported file format, skipping");
            }
            Err(source) => {
                tracing::error!(
                    job_id = %job_id,
                    file = %path.display(),
                    error = %source,
                    "Error processing file"
                );
                tracker
                    .update_progress(job_id, Progress::new(completed, total, false))
                    .await;
                return Err(JobError::File {
                    file: display_name(&path),
                    source,
                });
            }
        }

        completed += 1;
        tracker
            .update_progress(job_id, Progress::new(completed, total, true))
            .await;
    }

    if merged.is_empty() {
        return Err(JobError::NoOutput);
    }
    Ok(ReportTable::concat(merged))
}

async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(file = %path.display(), error = %e, "Could not remove upload");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::progress::ProgressEvent;
    use tokio::sync::broadcast::error::TryRecvError;

    async fn upload_with(files: &[(&str, &str)]) -> StagedUpload {
        let mut upload = StagedUpload::new(None).unwrap();
        for (name, contents) in files {
            upload.add_file(name, contents.as_bytes()).await.unwrap();
        }
        upload
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(e) => events.push(e),
                Err(TryRecvError::Empty) => break,
                Err(e) => panic!("receive failed: {e}"),
            }
        }
        events
    }

    #[tokio::test]
    async fn test_preprocess_merges_in_upload_order() {
        let tracker = JobTracker::new();
        let config = WorkerConfig::new(TextExtractor::new(), true);
        let upload = upload_with(&[
            ("first.txt", "first report"),
            ("cases.csv", "id,report\n1,from csv\n"),
            ("third.txt", "third report"),
        ])
        .await;
        tracker.register("job", upload.len()).await;
        let mut rx = tracker.subscribe();

        let table = preprocess(&tracker, &config, "job", &upload).await.unwrap();

        assert_eq!(
            table.to_csv(),
            "report,id\nfirst report,\nfrom csv,1\nthird report,\n"
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                ProgressEvent::update("job", Progress::new(1, 3, true)),
                ProgressEvent::update("job", Progress::new(2, 3, true)),
                ProgressEvent::update("job", Progress::new(3, 3, true)),
            ]
        );
        assert!(upload.files().iter().all(|f| !f.exists()));
    }

    #[tokio::test]
    async fn test_preprocess_stops_at_first_failure() {
        let tracker = JobTracker::new();
        let config = WorkerConfig::new(TextExtractor::new(), false);
        let upload = upload_with(&[
            ("ok.txt", "fine"),
            ("broken.csv", "a,b\n1,2,3\n"),
            ("never.txt", "not reached"),
        ])
        .await;
        tracker.register("job", upload.len()).await;
        let mut rx = tracker.subscribe();

        let err = preprocess(&tracker, &config, "job", &upload).await.unwrap_err();

        assert!(matches!(err, JobError::File { ref file, .. } if file == "broken.csv"));
        assert_eq!(
            drain(&mut rx),
            vec![
                ProgressEvent::update("job", Progress::new(1, 3, true)),
                ProgressEvent::update("job", Progress::new(1, 3, false)),
            ]
        );
        assert_eq!(tracker.progress("job").await, Some(Progress::new(1, 3, false)));
    }

    #[tokio::test]
    async fn test_preprocess_skips_unsupported_but_counts_them() {
        let tracker = JobTracker::new();
        let config = WorkerConfig::new(TextExtractor::new(), false);
        let upload = upload_with(&[("notes.md", "# heading"), ("a.txt", "kept")]).await;
        tracker.register("job", upload.len()).await;

        let table = preprocess(&tracker, &config, "job", &upload).await.unwrap();
        assert_eq!(table, ReportTable::from_report("kept"));
        assert_eq!(tracker.progress("job").await, Some(Progress::new(2, 2, true)));
    }

    #[tokio::test]
    async fn test_preprocess_without_output_fails() {
        let tracker = JobTracker::new();
        let config = WorkerConfig::new(TextExtractor::new(), false);
        let upload = upload_with(&[("notes.md", "# heading")]).await;
        tracker.register("job", upload.len()).await;

        let err = preprocess(&tracker, &config, "job", &upload).await.unwrap_err();
        assert!(matches!(err, JobError::NoOutput));
    }

    #[tokio::test]
    async fn test_worker_completes_queued_jobs() {
        let tracker = JobTracker::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(
            tracker.clone(),
            WorkerConfig::new(TextExtractor::new(), false),
            rx,
        ));

        let upload = upload_with(&[("a.txt", "alpha")]).await;
        let dir = upload.path().to_path_buf();
        tracker.register("one", 1).await;
        tx.send(JobRequest {
            job_id: "one".to_string(),
            upload,
        })
        .unwrap();
        drop(tx);
        worker.await.unwrap();

        match tracker.status("one").await {
            Some(crate::jobs::JobStatus::Completed(table)) => {
                assert_eq!(table.to_csv(), "report\nalpha\n");
            }
            other => panic!("unexpected status: {:?}", other),
        }
        assert!(!dir.exists());
    }
}
