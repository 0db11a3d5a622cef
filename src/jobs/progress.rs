//! Progress state and the events pushed to browsers.

use serde::Serialize;

use super::JobId;

/// Files finished, files in the job, and whether the job is still healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub success: bool,
}

impl Progress {
    pub fn new(completed: usize, total: usize, success: bool) -> Self {
        Self {
            completed,
            total,
            success,
        }
    }

    /// Completion in whole percent; an empty job counts as done.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            (self.completed * 100 / self.total).min(100)
        }
    }
}

/// Message sent over the push channel, serialized as
/// `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ProgressEvent {
    #[serde(rename = "progress_update")]
    Update {
        job_id: JobId,
        progress: usize,
        total: usize,
    },
    #[serde(rename = "progress_failed")]
    Failed { job_id: JobId },
    #[serde(rename = "progress_complete")]
    Complete { job_id: JobId },
}

impl ProgressEvent {
    pub fn update(job_id: &str, progress: Progress) -> Self {
        Self::Update {
            job_id: job_id.to_string(),
            progress: progress.completed,
            total: progress.total,
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::Update { job_id, .. } | Self::Failed { job_id } | Self::Complete { job_id } => {
                job_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(Progress::new(1, 4, true).percent(), 25);
        assert_eq!(Progress::new(3, 3, true).percent(), 100);
        assert_eq!(Progress::new(0, 0, true).percent(), 100);
    }

    #[test]
    fn test_event_wire_format() {
        let update = ProgressEvent::update("abc", Progress::new(2, 5, true));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({
                "event": "progress_update",
                "data": {"job_id": "abc", "progress": 2, "total": 5}
            })
        );

        let failed = ProgressEvent::Failed {
            job_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({"event": "progress_failed", "data": {"job_id": "abc"}})
        );
        assert_eq!(failed.job_id(), "abc");
    }
}
