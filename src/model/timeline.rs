//! Multi-track timeline.
//!
//! Track lists grow on demand: addressing track `k` pads the list with empty
//! tracks up to and including `k`. Clips on a track keep insertion order and
//! may overlap.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::clip::{Clip, ClipPatch};

/// Medium of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
}

impl Default for TrackType {
    fn default() -> Self {
        TrackType::Video
    }
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::Video => write!(f, "video"),
            TrackType::Audio => write!(f, "audio"),
        }
    }
}

impl std::str::FromStr for TrackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(TrackType::Video),
            "audio" => Ok(TrackType::Audio),
            other => Err(format!("unknown track type: {other}")),
        }
    }
}

/// Where a clip sits in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipLocation {
    pub track_type: TrackType,
    pub track_index: usize,
    /// Index within the track.
    pub position: usize,
}

/// One ordered sequence of clips.
pub type Track = Vec<Clip>;

/// Most tracks a single track list may hold. Indices at or past this are
/// unreachable and commands addressing them do nothing.
pub const MAX_TRACKS: usize = 256;

/// Growable list of tracks of one medium.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackList(Vec<Track>);

impl TrackList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A list holding `count` empty tracks.
    pub fn with_empty_tracks(count: usize) -> Self {
        Self(vec![Vec::new(); count])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.0.get_mut(index)
    }

    /// Mutable access to track `index`, padding with empty tracks first if
    /// the list is shorter. `None` when `index >= MAX_TRACKS`.
    pub fn track_mut_or_grow(&mut self, index: usize) -> Option<&mut Track> {
        if index >= MAX_TRACKS {
            return None;
        }
        if self.0.len() <= index {
            self.0.resize_with(index + 1, Vec::new);
        }
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Track> {
        self.0.iter_mut()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.0.iter().flatten()
    }

    pub fn clips_mut(&mut self) -> impl Iterator<Item = &mut Clip> {
        self.0.iter_mut().flatten()
    }

    fn locate(&self, clip_id: &str) -> Option<(usize, usize)> {
        self.0.iter().enumerate().find_map(|(track_index, track)| {
            track
                .iter()
                .position(|c| c.clip_id == clip_id)
                .map(|position| (track_index, position))
        })
    }

    /// Remove every clip whose id is in `ids`. Returns how many were removed.
    fn retain_clips(&mut self, ids: &HashSet<&str>) -> usize {
        let mut removed = 0;
        for track in &mut self.0 {
            let before = track.len();
            track.retain(|c| !ids.contains(c.clip_id.as_str()));
            removed += before - track.len();
        }
        removed
    }
}

impl std::ops::Index<usize> for TrackList {
    type Output = Track;

    fn index(&self, index: usize) -> &Track {
        &self.0[index]
    }
}

impl From<Vec<Track>> for TrackList {
    fn from(tracks: Vec<Track>) -> Self {
        Self(tracks)
    }
}

/// Video and audio tracks of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default)]
    pub video_tracks: TrackList,

    #[serde(default)]
    pub audio_tracks: TrackList,
}

impl Default for Timeline {
    /// One empty video track and one empty audio track.
    fn default() -> Self {
        Self {
            video_tracks: TrackList::with_empty_tracks(1),
            audio_tracks: TrackList::with_empty_tracks(1),
        }
    }
}

impl Timeline {
    pub fn tracks(&self, track_type: TrackType) -> &TrackList {
        match track_type {
            TrackType::Video => &self.video_tracks,
            TrackType::Audio => &self.audio_tracks,
        }
    }

    pub fn tracks_mut(&mut self, track_type: TrackType) -> &mut TrackList {
        match track_type {
            TrackType::Video => &mut self.video_tracks,
            TrackType::Audio => &mut self.audio_tracks,
        }
    }

    /// All clips, video tracks first.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.video_tracks.clips().chain(self.audio_tracks.clips())
    }

    pub fn clips_mut(&mut self) -> impl Iterator<Item = &mut Clip> {
        self.video_tracks
            .clips_mut()
            .chain(self.audio_tracks.clips_mut())
    }

    pub fn clip_count(&self) -> usize {
        self.clips().count()
    }

    /// Locate a clip, scanning video tracks before audio tracks.
    pub fn find_clip(&self, clip_id: &str) -> Option<ClipLocation> {
        [TrackType::Video, TrackType::Audio]
            .into_iter()
            .find_map(|track_type| {
                self.tracks(track_type)
                    .locate(clip_id)
                    .map(|(track_index, position)| ClipLocation {
                        track_type,
                        track_index,
                        position,
                    })
            })
    }

    pub fn clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips().find(|c| c.clip_id == clip_id)
    }

    /// Append `clip` to the given track, growing the track list as needed.
    /// Returns false, leaving the timeline untouched, when the track index
    /// is out of reach.
    pub fn push_clip(&mut self, track_type: TrackType, track_index: usize, clip: Clip) -> bool {
        match self.tracks_mut(track_type).track_mut_or_grow(track_index) {
            Some(track) => {
                track.push(clip);
                true
            }
            None => false,
        }
    }

    /// Merge-patch every clip with a matching id. Returns whether any matched.
    pub fn patch_clip(&mut self, clip_id: &str, patch: &ClipPatch) -> bool {
        let mut matched = false;
        for clip in self.clips_mut().filter(|c| c.clip_id == clip_id) {
            patch.apply(clip);
            matched = true;
        }
        matched
    }

    /// Remove the clip from every track. Returns how many entries were removed.
    pub fn remove_clip(&mut self, clip_id: &str) -> usize {
        let ids: HashSet<&str> = [clip_id].into_iter().collect();
        self.remove_clips(&ids)
    }

    pub fn remove_clips(&mut self, clip_ids: &HashSet<&str>) -> usize {
        self.video_tracks.retain_clips(clip_ids) + self.audio_tracks.retain_clips(clip_ids)
    }

    /// Replace the clip at `location` with `parts`, keeping its position.
    pub fn splice_clip(&mut self, location: ClipLocation, parts: impl IntoIterator<Item = Clip>) {
        let Some(track) = self
            .tracks_mut(location.track_type)
            .get_mut(location.track_index)
        else {
            return;
        };
        if location.position < track.len() {
            track.splice(location.position..=location.position, parts);
        }
    }

    /// End of the last clip on any track, or zero for an empty timeline.
    pub fn end_time(&self) -> f64 {
        self.clips().map(Clip::end_time).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_has_one_track_each() {
        let timeline = Timeline::default();
        assert_eq!(timeline.video_tracks.len(), 1);
        assert_eq!(timeline.audio_tracks.len(), 1);
        assert_eq!(timeline.clip_count(), 0);
    }

    #[test]
    fn test_push_grows_track_list() {
        let mut timeline = Timeline::default();
        timeline.push_clip(TrackType::Audio, 3, Clip::new("a", 0.0, 1.0));

        assert_eq!(timeline.audio_tracks.len(), 4);
        assert!(timeline.audio_tracks[0].is_empty());
        assert!(timeline.audio_tracks[2].is_empty());
        assert_eq!(timeline.audio_tracks[3].len(), 1);
        assert_eq!(timeline.video_tracks.len(), 1);
    }

    #[test]
    fn test_push_past_track_limit_is_rejected() {
        let mut timeline = Timeline::default();
        for index in [MAX_TRACKS, usize::MAX] {
            assert!(!timeline.push_clip(TrackType::Video, index, Clip::new("a", 0.0, 1.0)));
        }
        assert_eq!(timeline.video_tracks.len(), 1);
        assert_eq!(timeline.clip_count(), 0);

        assert!(timeline.push_clip(TrackType::Video, MAX_TRACKS - 1, Clip::new("a", 0.0, 1.0)));
        assert_eq!(timeline.video_tracks.len(), MAX_TRACKS);
    }

    #[test]
    fn test_find_prefers_video_tracks() {
        let mut timeline = Timeline::default();
        let mut audio = Clip::new("a", 0.0, 1.0);
        audio.clip_id = "dup".to_string();
        let mut video = Clip::new("v", 0.0, 1.0);
        video.clip_id = "dup".to_string();
        timeline.push_clip(TrackType::Audio, 0, audio);
        timeline.push_clip(TrackType::Video, 1, video);

        let location = timeline.find_clip("dup").unwrap();
        assert_eq!(location.track_type, TrackType::Video);
        assert_eq!(location.track_index, 1);
        assert_eq!(location.position, 0);
    }

    #[test]
    fn test_splice_keeps_neighbours_in_order() {
        let mut timeline = Timeline::default();
        let a = Clip::new("x", 0.0, 1.0);
        let b = Clip::new("x", 1.0, 1.0);
        let c = Clip::new("x", 2.0, 1.0);
        let (b_id, c_id) = (b.clip_id.clone(), c.clip_id.clone());
        for clip in [a, b, c] {
            timeline.push_clip(TrackType::Video, 0, clip);
        }

        let location = timeline.find_clip(&b_id).unwrap();
        let mut first = Clip::new("x", 1.0, 0.5);
        first.clip_id = "b1".to_string();
        let mut second = Clip::new("x", 1.5, 0.5);
        second.clip_id = "b2".to_string();
        timeline.splice_clip(location, [first, second]);

        let ids: Vec<&str> = timeline.video_tracks[0]
            .iter()
            .map(|c| c.clip_id.as_str())
            .collect();
        assert_eq!(&ids[1..], &["b1", "b2", c_id.as_str()]);
    }

    #[test]
    fn test_remove_clip_from_every_track() {
        let mut timeline = Timeline::default();
        let clip = Clip::new("a", 0.0, 1.0);
        let id = clip.clip_id.clone();
        timeline.push_clip(TrackType::Video, 0, clip.clone());
        timeline.push_clip(TrackType::Audio, 0, clip);

        assert_eq!(timeline.remove_clip(&id), 2);
        assert_eq!(timeline.remove_clip(&id), 0);
    }

    #[test]
    fn test_end_time() {
        let mut timeline = Timeline::default();
        assert_eq!(timeline.end_time(), 0.0);
        timeline.push_clip(TrackType::Video, 0, Clip::new("a", 2.0, 3.0));
        timeline.push_clip(TrackType::Audio, 2, Clip::new("a", 1.0, 9.0));
        assert_eq!(timeline.end_time(), 10.0);
    }

    #[test]
    fn test_json_shape_is_nested_arrays() {
        let timeline = Timeline::default();
        let value = serde_json::to_value(&timeline).unwrap();
        assert_eq!(value, serde_json::json!({"videoTracks": [[]], "audioTracks": [[]]}));
    }
}
