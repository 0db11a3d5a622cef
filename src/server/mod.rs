//! Web server for uploading documents and downloading the merged report.
//!
//! Provides:
//! - An upload form that queues a preprocessing job
//! - A live progress table fed over a WebSocket
//! - CSV download of finished jobs
//! - Optional HTTP basic auth for non-local deployments

mod assets;
mod auth;
mod flash;
mod handlers;
mod routes;
mod template_structs;

pub use flash::{FlashCategory, FlashMessage, FlashStore};
pub use routes::create_router;

use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::jobs::{JobManager, WorkerConfig};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jobs: JobManager,
    pub flash: Arc<FlashStore>,
}

impl AppState {
    /// Build the state and start the preprocessing worker.
    pub fn new(settings: Settings) -> Self {
        let extractor = TextExtractor::new().with_language(settings.ocr_language.clone());
        let jobs = JobManager::start(WorkerConfig::new(
            extractor,
            settings.parallel_preprocessing,
        ));

        Self {
            settings: Arc::new(settings),
            jobs,
            flash: Arc::new(FlashStore::default()),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let host = settings.host.clone();
    let port = settings.port;

    let state = AppState::new(settings);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    tracing::info!("Starting server at http://{}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
