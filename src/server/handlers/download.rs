//! CSV download of a finished job.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::super::flash::FlashCategory;
use super::super::AppState;
use crate::jobs::JobStatus;

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub job: Option<String>,
}

/// Serve the merged CSV of a completed job, or explain why it is not there.
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let Some(job_id) = params.job.filter(|j| !j.is_empty()) else {
        state
            .flash
            .push(FlashCategory::Danger, "No job selected for download.")
            .await;
        return Redirect::to("/").into_response();
    };

    let (category, message) = match state.jobs.tracker().status(&job_id).await {
        Some(JobStatus::Completed(table)) => {
            tracing::info!(job_id = %job_id, rows = table.len(), "Serving report");
            return (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"report-{}.csv\"", job_id),
                    ),
                ],
                table.to_csv(),
            )
                .into_response();
        }
        Some(JobStatus::Queued) | Some(JobStatus::Running) => (
            FlashCategory::Warning,
            format!("Job {} is still running", job_id),
        ),
        Some(JobStatus::Failed(reason)) => {
            tracing::debug!(job_id = %job_id, reason = %reason, "Download of failed job");
            (
                FlashCategory::Danger,
                "Preprocessing failed / did not output anything useful!".to_string(),
            )
        }
        None => (FlashCategory::Danger, format!("Job {} not found", job_id)),
    };

    state.flash.push(category, message).await;
    Redirect::to("/").into_response()
}
