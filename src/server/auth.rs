//! HTTP basic authentication for non-local deployments.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::AppState;

const REALM: &str = "Basic realm=\"LLM Anonymizer\", charset=\"UTF-8\"";

/// Reject requests that do not carry the configured password.
/// Any user name is accepted.
pub async fn require_password(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = state.settings.password.as_deref().unwrap_or_default();
    if password_matches(request.headers().get(header::AUTHORIZATION), expected) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, REALM)],
        "Authentication required",
    )
        .into_response()
}

fn password_matches(header: Option<&HeaderValue>, expected: &str) -> bool {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded.trim()).ok())
        .and_then(|raw| String::from_utf8(raw).ok())
        .and_then(|credentials| {
            credentials
                .split_once(':')
                .map(|(_, password)| constant_time_eq(password.as_bytes(), expected.as_bytes()))
        })
        .unwrap_or(false)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
