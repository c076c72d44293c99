//! Purpose: Shared append-only diagnostic trace of operation outcomes.
//! Exports: `MessageLog`.
//! Role: Constructed once per process and handed to every consumer by clone.
//! Invariants: Lines are kept in append order (completion order of operations).
//! Invariants: No eviction; `clear` is the only removal path.
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, line: impl Into<String>) {
        self.lock().push(line.into());
    }

    /// Snapshot of every line logged so far.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Lines logged at or after `start`, for callers tracking their own cursor.
    pub fn messages_since(&self, start: usize) -> Vec<String> {
        self.lock().iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
