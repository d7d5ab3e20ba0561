//! Project Store
//!
//! The owned, constructible state handle for one open project. It holds the
//! tracked document, the untracked view state and the undo history, and
//! exposes every mutation command.
//!
//! Commands never fail. An unknown id or an out-of-range argument leaves
//! the store untouched, so UI code can call them speculatively.
//!
//! After each command (or once per outermost batch) the store compares the
//! document against the history baseline, records an undo step if it
//! changed, and notifies subscribers.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::model::project::{clamp_current_time, clamp_timeline_scale};
use crate::model::{
    Asset, AssetPatch, Clip, ClipLocation, ClipPatch, ProjectDocument, ProjectSnapshot,
    Selection, TrackType, ViewState, DEFAULT_CLIP_DURATION,
};
use crate::state::undo::HistoryManager;

/// Handle returned by [`ProjectStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What caused a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A content command (or batch) changed the document.
    Edit,
    /// Only view state (selection, playhead, play flag, zoom) changed.
    View,
    Undo,
    Redo,
    /// The document was replaced from storage without an undo step.
    Hydrate,
}

/// Notification delivered to subscribers after a change settles.
#[derive(Debug)]
pub struct StoreEvent<'a> {
    pub kind: ChangeKind,
    /// Label of the edit for [`ChangeKind::Edit`].
    pub label: Option<&'a str>,
    pub document: &'a ProjectDocument,
    pub view: &'a ViewState,
}

impl StoreEvent<'_> {
    /// True when the tracked document changed.
    pub fn content_changed(&self) -> bool {
        self.kind != ChangeKind::View
    }

    /// Owned copy of the full project.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            document: self.document.clone(),
            view: self.view.clone(),
        }
    }
}

type Observer = Box<dyn FnMut(&StoreEvent<'_>) + Send>;

#[derive(Debug, Default, Clone, Copy)]
struct Dirty {
    content: bool,
    view: bool,
}

pub struct ProjectStore {
    document: ProjectDocument,
    view: ViewState,
    history: HistoryManager,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    batch_depth: usize,
    batch_label: Option<String>,
    dirty: Dirty,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("document", &self.document)
            .field("view", &self.view)
            .field("undo_count", &self.history.undo_count())
            .field("redo_count", &self.history.redo_count())
            .field("observers", &self.observers.len())
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}

impl ProjectStore {
    /// A store holding the canonical default project.
    pub fn new() -> Self {
        Self::with_history_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        let document = ProjectDocument::default();
        Self {
            history: HistoryManager::new(capacity, document.clone()),
            document,
            view: ViewState::default(),
            observers: Vec::new(),
            next_subscription: 0,
            batch_depth: 0,
            batch_label: None,
            dirty: Dirty::default(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn document(&self) -> &ProjectDocument {
        &self.document
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.view.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Owned copy of the full project, as persisted.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            document: self.document.clone(),
            view: self.view.clone(),
        }
    }

    pub fn asset(&self, asset_id: &str) -> Option<&Asset> {
        self.document.asset(asset_id)
    }

    pub fn clip(&self, clip_id: &str) -> Option<&Clip> {
        self.document.timeline.clip(clip_id)
    }

    pub fn find_clip(&self, clip_id: &str) -> Option<ClipLocation> {
        self.document.timeline.find_clip(clip_id)
    }

    pub fn is_selected(&self, clip_id: &str) -> bool {
        self.view.selection.contains(clip_id)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a callback run after every settled change.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&StoreEvent<'_>) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a subscriber. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    // ------------------------------------------------------------------
    // Asset library
    // ------------------------------------------------------------------

    /// Append an asset. Id uniqueness is the caller's responsibility.
    pub fn add_asset(&mut self, mut asset: Asset) {
        asset.sanitize();
        self.document.asset_library.push(asset);
        self.commit_content("Add asset");
    }

    pub fn update_asset(&mut self, asset_id: &str, patch: &AssetPatch) {
        let Some(asset) = self
            .document
            .asset_library
            .iter_mut()
            .find(|a| a.asset_id == asset_id)
        else {
            return;
        };
        patch.apply(asset);
        self.commit_content("Update asset");
    }

    /// Remove an asset from the library. Clips placed from it stay on the
    /// timeline with a dangling `asset_id`.
    pub fn remove_asset(&mut self, asset_id: &str) {
        let before = self.document.asset_library.len();
        self.document
            .asset_library
            .retain(|a| a.asset_id != asset_id);
        if self.document.asset_library.len() != before {
            self.commit_content("Remove asset");
        }
    }

    // ------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------

    /// Place `asset` on the timeline. The clip lasts as long as the asset,
    /// or [`DEFAULT_CLIP_DURATION`] when the asset has no usable duration.
    /// Returns the new clip id.
    ///
    /// No-op returning `None` when `start_time` is not finite or
    /// `track_index` is at or past [`MAX_TRACKS`](crate::model::MAX_TRACKS).
    pub fn add_clip_to_timeline(
        &mut self,
        asset: &Asset,
        start_time: f64,
        track_type: TrackType,
        track_index: usize,
    ) -> Option<String> {
        if !start_time.is_finite() {
            return None;
        }
        let duration = asset
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(DEFAULT_CLIP_DURATION);
        let clip = Clip::new(asset.asset_id.clone(), clamp_current_time(start_time), duration);
        let clip_id = clip.clip_id.clone();

        if !self
            .document
            .timeline
            .push_clip(track_type, track_index, clip)
        {
            debug!(%track_type, track_index, "Track index out of range, clip not added");
            return None;
        }
        self.commit_content("Add clip");
        Some(clip_id)
    }

    /// [`add_clip_to_timeline`](Self::add_clip_to_timeline) on the first video track.
    pub fn add_clip(&mut self, asset: &Asset, start_time: f64) -> Option<String> {
        self.add_clip_to_timeline(asset, start_time, TrackType::Video, 0)
    }

    pub fn update_clip_properties(&mut self, clip_id: &str, patch: &ClipPatch) {
        if self.document.timeline.patch_clip(clip_id, patch) {
            self.commit_content("Update clip");
        }
    }

    /// Remove the clip from every track and drop it from the selection.
    pub fn remove_clip(&mut self, clip_id: &str) {
        if self.document.timeline.remove_clip(clip_id) == 0 {
            return;
        }
        if self.view.selection.contains(clip_id) {
            self.view.selection.remove(clip_id);
            self.dirty.view = true;
        }
        self.commit_content("Remove clip");
    }

    /// Cut a clip in two at `time`. The halves replace the original at its
    /// track position and the first half becomes the sole selection.
    ///
    /// No-op when the clip is missing or `time` is not strictly inside it.
    pub fn split_clip(&mut self, clip_id: &str, time: f64) {
        let Some(location) = self.document.timeline.find_clip(clip_id) else {
            return;
        };
        let Some((first, second)) = self
            .document
            .timeline
            .tracks(location.track_type)
            .get(location.track_index)
            .and_then(|track| track.get(location.position))
            .and_then(|clip| clip.split_at(time))
        else {
            return;
        };

        let first_id = first.clip_id.clone();
        self.document.timeline.splice_clip(location, [first, second]);
        self.view.selection.select(Some(first_id));
        self.dirty.view = true;
        self.commit_content("Split clip");
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn set_selected_clip_id(&mut self, clip_id: Option<&str>) {
        self.update_view(|view| view.selection.select(clip_id.map(str::to_string)));
    }

    pub fn set_selected_clip_ids(&mut self, clip_ids: Vec<String>) {
        self.update_view(|view| view.selection.set(clip_ids));
    }

    pub fn add_to_selection(&mut self, clip_id: &str) {
        self.update_view(|view| view.selection.add(clip_id));
    }

    pub fn remove_from_selection(&mut self, clip_id: &str) {
        self.update_view(|view| view.selection.remove(clip_id));
    }

    pub fn toggle_selection(&mut self, clip_id: &str) {
        self.update_view(|view| view.selection.toggle(clip_id));
    }

    pub fn clear_selection(&mut self) {
        self.update_view(|view| view.selection.clear());
    }

    // ------------------------------------------------------------------
    // Transport and zoom
    // ------------------------------------------------------------------

    /// Move the playhead, clamped to zero. Non-finite times are ignored.
    pub fn set_current_time(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        self.update_view(|view| view.current_time = clamp_current_time(time));
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.update_view(|view| view.is_playing = playing);
    }

    /// Set the zoom, clamped to `[MIN_TIMELINE_SCALE, MAX_TIMELINE_SCALE]`.
    pub fn set_timeline_scale(&mut self, scale: f64) {
        self.update_view(|view| view.timeline_scale = clamp_timeline_scale(scale));
    }

    // ------------------------------------------------------------------
    // Batch operations over the selection
    // ------------------------------------------------------------------

    pub fn delete_selected_clips(&mut self) {
        if self.view.selection.is_empty() {
            return;
        }
        let ids: HashSet<&str> = self.view.selection.ids().iter().map(String::as_str).collect();
        self.document.timeline.remove_clips(&ids);
        self.view.selection.clear();
        self.dirty.view = true;
        self.commit_content("Delete clips");
    }

    /// Shift every selected clip by `delta` seconds. Each start time is
    /// clamped to zero on its own; overlaps are allowed.
    pub fn move_selected_clips(&mut self, delta: f64) {
        if self.view.selection.is_empty() || !delta.is_finite() {
            return;
        }
        let selection = &self.view.selection;
        for clip in self
            .document
            .timeline
            .clips_mut()
            .filter(|c| selection.contains(&c.clip_id))
        {
            let moved = clip.start_time + delta;
            if moved.is_finite() {
                clip.start_time = moved.max(0.0);
            }
        }
        self.commit_content("Move clips");
    }

    /// Merge-patch every selected clip on any track.
    pub fn update_selected_clips_properties(&mut self, patch: &ClipPatch) {
        if self.view.selection.is_empty() {
            return;
        }
        let selection = &self.view.selection;
        for clip in self
            .document
            .timeline
            .clips_mut()
            .filter(|c| selection.contains(&c.clip_id))
        {
            patch.apply(clip);
        }
        self.commit_content("Update clips");
    }

    // ------------------------------------------------------------------
    // Whole-document operations
    // ------------------------------------------------------------------

    /// Replace the whole project. Recorded as a single undo step.
    pub fn load_project(&mut self, mut snapshot: ProjectSnapshot) {
        snapshot.view.sanitize();
        self.document = snapshot.document;
        self.view = snapshot.view;
        self.dirty.view = true;
        self.commit_content("Load project");
    }

    /// Replace the project with the canonical default.
    pub fn reset_project(&mut self) {
        self.load_project(ProjectSnapshot::default());
    }

    /// Replace the project with one read from storage. Unlike
    /// [`load_project`](Self::load_project) this records nothing and clears
    /// history, so undo cannot return to the pre-load default.
    pub fn hydrate(&mut self, mut snapshot: ProjectSnapshot) {
        snapshot.view.sanitize();
        self.document = snapshot.document;
        self.view = snapshot.view;
        self.history.rebase(self.document.clone());
        self.dirty = Dirty::default();
        debug!(
            name = %self.document.project_settings.name,
            clips = self.document.timeline.clip_count(),
            "Store hydrated"
        );
        self.notify(ChangeKind::Hydrate, None);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.close_open_batch("undo");
        let Some(previous) = self.history.undo() else {
            return false;
        };
        self.document = previous.clone();
        self.notify(ChangeKind::Undo, None);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.close_open_batch("redo");
        let Some(next) = self.history.redo() else {
            return false;
        };
        self.document = next.clone();
        self.notify(ChangeKind::Redo, None);
        true
    }

    /// Forget all undo/redo steps without touching the document.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    // ------------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------------

    /// Open a batch. Until the matching outermost [`end_batch`](Self::end_batch),
    /// commands are not recorded and subscribers are not notified. Nested
    /// calls only deepen the batch; the outermost label wins.
    pub fn begin_batch(&mut self, label: &str) {
        if self.batch_depth == 0 {
            self.batch_label = Some(label.to_string());
            debug!(label, "Batch started");
        }
        self.batch_depth += 1;
    }

    /// Close a batch. Closing the outermost batch records at most one undo
    /// step for everything done inside it.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            warn!("end_batch called without an open batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            let label = self.batch_label.take().unwrap_or_default();
            debug!(label = %label, "Batch ended");
            self.flush(&label);
        }
    }

    /// Run `f` inside a batch so all its commands form one undo step.
    pub fn batch<R>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_batch(label);
        let result = f(self);
        self.end_batch();
        result
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn update_view(&mut self, f: impl FnOnce(&mut ViewState)) {
        let before = self.view.clone();
        f(&mut self.view);
        if self.view != before {
            self.dirty.view = true;
            if self.batch_depth == 0 {
                self.flush("");
            }
        }
    }

    fn commit_content(&mut self, label: &str) {
        self.dirty.content = true;
        if self.batch_depth == 0 {
            self.flush(label);
        }
    }

    fn flush(&mut self, label: &str) {
        let dirty = std::mem::take(&mut self.dirty);
        let recorded = dirty.content && self.history.record(&self.document, label);
        if recorded {
            self.notify(ChangeKind::Edit, Some(label));
        } else if dirty.view {
            self.notify(ChangeKind::View, None);
        }
    }

    fn close_open_batch(&mut self, action: &str) {
        if self.batch_depth > 0 {
            warn!(action, "Closing open batch before history navigation");
            self.batch_depth = 1;
            self.end_batch();
        }
    }

    fn notify(&mut self, kind: ChangeKind, label: Option<&str>) {
        let Self {
            observers,
            document,
            view,
            ..
        } = self;
        let event = StoreEvent {
            kind,
            label,
            document: &*document,
            view: &*view,
        };
        for (_, observer) in observers.iter_mut() {
            observer(&event);
        }
    }
}
