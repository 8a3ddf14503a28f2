//! Per-tab analytics session identifier.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use spin::Mutex;
use uuid::Uuid;

/// Storage key holding the session identifier.
pub const SESSION_ID_KEY: &str = "analytics_session_id";

/// Key/value storage scoped to one browsing session (e.g. `sessionStorage`).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);
}

/// In-memory [`SessionStore`] living as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

/// Return the stored session id, creating and storing one on first access.
pub fn session_id(store: &dyn SessionStore) -> String {
    if let Some(existing) = store.get(SESSION_ID_KEY) {
        return existing;
    }

    let created = new_session_id();
    store.set(SESSION_ID_KEY, &created);
    tracing::debug!(session_id = %created, "Created analytics session");
    created
}

fn new_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("session_{millis}_{}", Uuid::new_v4().simple())
}
