//! Application state shared across handlers.

use std::sync::Arc;

use chat_core::MessageStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Where replies (and optionally user messages) are written.
    pub store: Arc<dyn MessageStore>,
    /// Persist the incoming user message before the reply.
    pub store_user_message: bool,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            store_user_message: false,
        }
    }

    pub fn storing_user_messages(mut self, enabled: bool) -> Self {
        self.store_user_message = enabled;
        self
    }
}
