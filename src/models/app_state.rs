use std::sync::Arc;

use crate::sync::store::MemoryStore;

/// Application state shared between connections. The room store is the
/// single authoritative home of every live session document.
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
