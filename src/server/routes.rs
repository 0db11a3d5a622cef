//! Router configuration for the web server.

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Upload form (GET) and upload submission (POST)
        .route("/", get(handlers::index).post(handlers::upload))
        .route("/download", get(handlers::download))
        // Progress push channel
        .route("/ws", get(handlers::ws_handler))
        // Static assets (CSS/JS)
        .route("/static/style.css", get(handlers::serve_css))
        .route("/static/app.js", get(handlers::serve_js))
        .layer(DefaultBodyLimit::max(state.settings.upload_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if state.settings.auth_required {
        router = router.layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_password,
        ));
    }

    router.with_state(state)
}
