//! Download history persistence.
//!
//! Calls are fire-and-forget from the orchestrator's side: implementations
//! report their own failures.

use crate::orchestrator::OrchestrationState;

use reqwest::Url;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// Opaque key of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryId(pub u64);

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What is known about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub url: Url,
    pub content_name: Option<String>,
    pub content_size: Option<u64>,
    pub mime_type: Option<String>,
    /// Where the finished content was stored.
    pub path: Option<PathBuf>,
    pub state: OrchestrationState,
}

impl HistoryRecord {
    /// A record for a freshly submitted request.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            content_name: None,
            content_size: None,
            mime_type: None,
            path: None,
            state: OrchestrationState::Idle,
        }
    }
}

/// Stores the history of download requests.
pub trait Persistence: Send + Sync {
    fn create_record(&self, id: HistoryId, record: &HistoryRecord);
    fn update_record(&self, id: HistoryId, record: &HistoryRecord);
    fn update_state(&self, id: HistoryId, state: OrchestrationState);
    fn delete_record(&self, id: HistoryId);
}

/// Keeps no history at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl Persistence for NoHistory {
    fn create_record(&self, _id: HistoryId, _record: &HistoryRecord) {}
    fn update_record(&self, _id: HistoryId, _record: &HistoryRecord) {}
    fn update_state(&self, _id: HistoryId, _state: OrchestrationState) {}
    fn delete_record(&self, _id: HistoryId) {}
}

/// In-memory history, mostly useful for inspection and tests.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Mutex<HashMap<HistoryId, HistoryRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of a record.
    pub fn get(&self, id: HistoryId) -> Option<HistoryRecord> {
        self.records.lock().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Persistence for MemoryHistory {
    fn create_record(&self, id: HistoryId, record: &HistoryRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(id, record.clone());
        }
    }

    fn update_record(&self, id: HistoryId, record: &HistoryRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(id, record.clone());
        }
    }

    fn update_state(&self, id: HistoryId, state: OrchestrationState) {
        if let Ok(mut records) = self.records.lock() {
            if let Some(record) = records.get_mut(&id) {
                record.state = state;
            }
        }
    }

    fn delete_record(&self, id: HistoryId) {
        if let Ok(mut records) = self.records.lock() {
            records.remove(&id);
        }
    }
}
