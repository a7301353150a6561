//! Bounded log store for captured exchanges.

use std::collections::VecDeque;

use parking_lot::RwLock;

use super::entry::LogEntry;
use crate::observability::metrics;

/// Most-recent-first buffer holding at most `max_logs` entries.
pub struct LogStore {
    entries: RwLock<VecDeque<LogEntry>>,
    max_logs: usize,
}

impl LogStore {
    pub fn new(max_logs: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_logs.min(1024))),
            max_logs,
        }
    }

    /// Insert at the front, dropping the oldest entries beyond the limit.
    pub fn append(&self, entry: LogEntry) {
        let len = {
            let mut entries = self.entries.write();
            entries.push_front(entry);
            entries.truncate(self.max_logs);
            entries.len()
        };
        metrics::record_log_size(len);
    }

    pub fn find(&self, id: &str) -> Option<LogEntry> {
        self.entries.read().iter().find(|e| e.id == id).cloned()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        metrics::record_log_size(0);
    }

    /// All entries, most recent first.
    pub fn list(&self) -> Vec<LogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn max_logs(&self) -> usize {
        self.max_logs
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(super::DEFAULT_MAX_LOGS)
    }
}
