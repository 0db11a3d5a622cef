//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.

use askama::Template;

use super::flash::FlashMessage;
use crate::jobs::{JobSnapshot, JobStatus};

/// Helper struct for job rows in the progress table.
pub struct JobRow {
    pub job_id: String,
    pub state: &'static str,
    pub completed: usize,
    pub total: usize,
    pub percent: usize,
    pub download: bool,
}

impl From<JobSnapshot> for JobRow {
    fn from(job: JobSnapshot) -> Self {
        Self {
            download: matches!(job.status, JobStatus::Completed(_)),
            state: job.status.label(),
            completed: job.progress.completed,
            total: job.progress.total,
            percent: job.progress.percent(),
            job_id: job.job_id,
        }
    }
}

/// Upload form and progress page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub mode: &'a str,
    pub flashes: Vec<FlashMessage>,
    pub jobs: Vec<JobRow>,
    pub accept: String,
}
