//! Upload form and upload submission.

use std::path::Path;

use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use super::super::flash::FlashCategory;
use super::super::template_structs::{IndexTemplate, JobRow};
use super::super::AppState;
use crate::extract::DocumentKind;
use crate::jobs::StagedUpload;
use crate::utils::secure_filename;

/// Page title.
pub const TITLE: &str = "LLM Anonymizer";

/// Multipart field carrying the uploaded files.
const FILES_FIELD: &str = "files";

/// Upload form with flash messages and the progress of every job.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let flashes = state.flash.take().await;
    let jobs: Vec<JobRow> = state
        .jobs
        .tracker()
        .snapshot()
        .await
        .into_iter()
        .map(JobRow::from)
        .collect();

    let template = IndexTemplate {
        title: TITLE,
        mode: state.settings.mode.label(),
        flashes,
        jobs,
        accept: DocumentKind::accept_attribute(),
    };
    Html(template.render().unwrap_or_else(|e| e.to_string()))
}

/// Why an upload was not queued.
enum UploadRejection {
    Unsupported(String),
    Failed(String),
}

/// Stage the uploaded files and queue a preprocessing job.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    match stage_upload(&state, &mut multipart).await {
        Ok(upload) if upload.is_empty() => {
            state
                .flash
                .push(FlashCategory::Warning, "Please select at least one file.")
                .await;
        }
        Ok(upload) => match state.jobs.submit(upload).await {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, "Upload accepted");
                state
                    .flash
                    .push(FlashCategory::Success, "Upload Successful!")
                    .await;
            }
            Err(e) => {
                state
                    .flash
                    .push(FlashCategory::Danger, format!("Could not start job: {}", e))
                    .await;
            }
        },
        Err(UploadRejection::Unsupported(name)) => {
            state
                .flash
                .push(
                    FlashCategory::Danger,
                    format!(
                        "Unsupported file type: {}. Allowed: {}",
                        name,
                        DocumentKind::EXTENSIONS.join(", ")
                    ),
                )
                .await;
        }
        Err(UploadRejection::Failed(reason)) => {
            tracing::warn!(reason = %reason, "Upload failed");
            state
                .flash
                .push(FlashCategory::Danger, format!("Upload failed: {}", reason))
                .await;
        }
    }

    Redirect::to("/").into_response()
}

async fn stage_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<StagedUpload, UploadRejection> {
    let mut upload = StagedUpload::new(state.settings.work_dir.as_deref())
        .map_err(|e| UploadRejection::Failed(e.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadRejection::Failed(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        if DocumentKind::from_path(Path::new(&secure_filename(&file_name))).is_none() {
            return Err(UploadRejection::Unsupported(file_name));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| UploadRejection::Failed(e.to_string()))?;
        upload
            .add_file(&file_name, &data)
            .await
            .map_err(|e| UploadRejection::Failed(e.to_string()))?;
    }

    Ok(upload)
}
