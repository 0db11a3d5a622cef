//! Progress push channel.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use super::super::AppState;
use crate::jobs::{JobTracker, ProgressEvent};

/// Upgrade to a WebSocket that streams progress events.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.jobs.tracker().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, tracker))
}

/// Replay current progress, then forward live events until the client leaves.
async fn handle_socket(socket: WebSocket, tracker: JobTracker) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Client connected");

    // Subscribe before the replay so nothing falls between the two.
    let mut events = tracker.subscribe();
    let backlog = tracker.replay().await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        for event in &backlog {
            if send_event(&mut sink, event).await.is_err() {
                return;
            }
        }
        loop {
            match events.recv().await {
                Ok(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(conn_id = %sender_conn_id, skipped, "Client lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Inbound messages carry nothing; read until close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Client disconnected");
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ProgressEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).map_err(axum::Error::new)?;
    sink.send(Message::Text(text)).await
}
