//! Undo/Redo History
//!
//! Snapshot-based, bounded, linear history over the tracked half of a
//! project ([`ProjectDocument`]). View state never enters a snapshot.
//!
//! The manager keeps the last recorded document as its baseline. Recording
//! a document that differs from the baseline pushes the baseline onto the
//! undo stack, clears the redo stack and makes the new document the
//! baseline. Recording an equal document does nothing, so edits that turn
//! out to be no-ops leave no trace.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::model::ProjectDocument;

/// A recorded document state plus the edit it belongs to.
///
/// On the undo stack the state is what the document looked like *before*
/// the labelled edit; on the redo stack it is what it looked like *after*.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Human-readable description of the edit, e.g. "Split clip".
    pub label: String,

    /// When the edit was recorded.
    pub timestamp: DateTime<Utc>,

    pub state: ProjectDocument,
}

impl HistoryEntry {
    fn new(label: impl Into<String>, state: ProjectDocument) -> Self {
        Self {
            label: label.into(),
            timestamp: Utc::now(),
            state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    /// Oldest entry at the front.
    past: VecDeque<HistoryEntry>,

    /// Most recently undone entry at the back.
    future: Vec<HistoryEntry>,

    /// Last recorded document.
    current: ProjectDocument,

    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, ProjectDocument::default())
    }
}

impl HistoryManager {
    /// Create a history with the given capacity and starting document.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, baseline: ProjectDocument) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            current: baseline,
            capacity: capacity.max(1),
        }
    }

    /// Record the document after an edit. Returns true if an entry was pushed.
    pub fn record(&mut self, document: &ProjectDocument, label: &str) -> bool {
        if *document == self.current {
            return false;
        }

        let previous = std::mem::replace(&mut self.current, document.clone());
        self.past.push_back(HistoryEntry::new(label, previous));
        self.future.clear();
        self.evict_overflow();

        debug!(label, undo_depth = self.past.len(), "History entry pushed");
        true
    }

    /// Step back one edit. Returns the document to restore, or `None` if
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<&ProjectDocument> {
        let entry = self.past.pop_back()?;
        let after = std::mem::replace(&mut self.current, entry.state);

        debug!(label = %entry.label, undo_remaining = self.past.len(), "Undo");
        self.future.push(HistoryEntry::new(entry.label, after));
        Some(&self.current)
    }

    /// Re-apply the most recently undone edit. Returns the document to
    /// restore, or `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Option<&ProjectDocument> {
        let entry = self.future.pop()?;
        let before = std::mem::replace(&mut self.current, entry.state);

        debug!(label = %entry.label, redo_remaining = self.future.len(), "Redo");
        self.past.push_back(HistoryEntry::new(entry.label, before));
        self.evict_overflow();
        Some(&self.current)
    }

    /// Drop both stacks, keeping the baseline.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        debug!("History cleared");
    }

    /// Replace the baseline without recording an entry and drop both stacks.
    ///
    /// Used when a document comes from storage rather than from an edit.
    pub fn rebase(&mut self, document: ProjectDocument) {
        self.current = document;
        self.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    /// Label of the edit the next `undo` reverts.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|e| e.label.as_str())
    }

    /// Label of the edit the next `redo` re-applies.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label.as_str())
    }

    /// The last recorded document.
    pub fn baseline(&self) -> &ProjectDocument {
        &self.current
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_overflow();
    }

    /// Undo stack labels, most recent first.
    pub fn undo_stack_summary(&self) -> Vec<(String, DateTime<Utc>)> {
        self.past
            .iter()
            .rev()
            .map(|e| (e.label.clone(), e.timestamp))
            .collect()
    }

    fn evict_overflow(&mut self) {
        while self.past.len() > self.capacity {
            if let Some(evicted) = self.past.pop_front() {
                debug!(label = %evicted.label, "Evicted oldest history entry");
            }
        }
    }
}
