//! One-shot messages shown on the next page render.

use tokio::sync::Mutex;

/// Bootstrap alert class of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCategory {
    Success,
    Warning,
    Danger,
}

impl FlashCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub category: FlashCategory,
    pub message: String,
}

/// Pending flash messages. The app serves a single operator, so messages
/// are kept process-wide rather than per session.
#[derive(Debug, Default)]
pub struct FlashStore {
    messages: Mutex<Vec<FlashMessage>>,
}

impl FlashStore {
    pub async fn push(&self, category: FlashCategory, message: impl Into<String>) {
        self.messages.lock().await.push(FlashMessage {
            category,
            message: message.into(),
        });
    }

    /// Drain all pending messages.
    pub async fn take(&self) -> Vec<FlashMessage> {
        std::mem::take(&mut *self.messages.lock().await)
    }
}
