use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Last-observed play counts keyed by identity, one instance per category
/// (movies, episodes). Persisted between passes; the delta computation
/// compares the current snapshot against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncState {
    entries: HashMap<String, u32>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn record(&mut self, key: impl Into<String>, play_count: u32) {
        self.entries.insert(key.into(), play_count);
    }

    pub fn play_count(&self, key: &str) -> Option<u32> {
        self.entries.get(key).copied()
    }

    /// An item is changed when it was never observed or its play count moved
    /// since the last persisted state. An empty state treats everything as
    /// changed (first run syncs the full library).
    pub fn is_changed(&self, key: &str, current_play_count: u32) -> bool {
        match self.entries.get(key) {
            Some(last) => *last != current_play_count,
            None => true,
        }
    }
}

/// Per-pass counters, reported at the end of a pass and then discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub movies_exported: usize,
    pub episodes_exported: usize,
    pub movies_imported: usize,
    pub episodes_imported: usize,
    pub unmarked: usize,
    pub errors: usize,
}

impl SyncStats {
    pub fn total_exported(&self) -> usize {
        self.movies_exported + self.episodes_exported
    }

    pub fn total_imported(&self) -> usize {
        self.movies_imported + self.episodes_imported
    }
}
