//! Clip selection.
//!
//! Two views of one selection are kept in step: the ordered id list and a
//! primary id that is set exactly when the list holds a single clip.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    selected_clip_id: Option<String>,

    #[serde(default)]
    selected_clip_ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected clip when exactly one is selected.
    pub fn primary(&self) -> Option<&str> {
        self.selected_clip_id.as_deref()
    }

    pub fn ids(&self) -> &[String] {
        &self.selected_clip_ids
    }

    pub fn len(&self) -> usize {
        self.selected_clip_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_clip_ids.is_empty()
    }

    pub fn contains(&self, clip_id: &str) -> bool {
        self.selected_clip_ids.iter().any(|id| id == clip_id)
    }

    /// Select one clip, or clear the selection with `None`.
    pub fn select(&mut self, clip_id: Option<String>) {
        self.selected_clip_ids = clip_id.into_iter().collect();
        self.sync_primary();
    }

    /// Replace the selection, dropping repeated ids.
    pub fn set(&mut self, clip_ids: Vec<String>) {
        self.selected_clip_ids = clip_ids;
        self.dedup();
        self.sync_primary();
    }

    pub fn add(&mut self, clip_id: &str) {
        if !self.contains(clip_id) {
            self.selected_clip_ids.push(clip_id.to_string());
        }
        self.sync_primary();
    }

    pub fn remove(&mut self, clip_id: &str) {
        self.selected_clip_ids.retain(|id| id != clip_id);
        self.sync_primary();
    }

    pub fn toggle(&mut self, clip_id: &str) {
        if self.contains(clip_id) {
            self.remove(clip_id);
        } else {
            self.add(clip_id);
        }
    }

    pub fn clear(&mut self) {
        self.selected_clip_ids.clear();
        self.sync_primary();
    }

    /// Re-establish the invariant after deserializing untrusted input.
    pub fn normalize(&mut self) {
        self.dedup();
        self.sync_primary();
    }

    fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.selected_clip_ids.retain(|id| seen.insert(id.clone()));
    }

    fn sync_primary(&mut self) {
        self.selected_clip_id = match self.selected_clip_ids.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
    }
}
