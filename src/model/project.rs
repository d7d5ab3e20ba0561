//! Project document schema.
//!
//! A project splits into two parts:
//! - [`ProjectDocument`]: settings, asset library and timeline. This is the
//!   content that undo/redo tracks.
//! - [`ViewState`]: selection, playhead, play flag and zoom. Never recorded
//!   in history.
//!
//! [`ProjectSnapshot`] joins both into the flat JSON shape that gets persisted.

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::clip::Clip;
use super::selection::Selection;
use super::timeline::Timeline;

/// Lower bound of the timeline zoom scale.
pub const MIN_TIMELINE_SCALE: f64 = 10.0;

/// Upper bound of the timeline zoom scale.
pub const MAX_TIMELINE_SCALE: f64 = 200.0;

/// Zoom scale of a fresh project.
pub const DEFAULT_TIMELINE_SCALE: f64 = 50.0;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";
pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_PROJECT_DURATION: f64 = 60.0;

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "4K")]
    Uhd4k,
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::FullHd
    }
}

impl Resolution {
    /// Frame size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::FullHd => (1920, 1080),
            Resolution::Uhd4k => (3840, 2160),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::FullHd => write!(f, "1080p"),
            Resolution::Uhd4k => write!(f, "4K"),
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1080p" | "fullhd" => Ok(Resolution::FullHd),
            "4k" | "2160p" => Ok(Resolution::Uhd4k),
            other => Err(format!("unknown resolution: {other}")),
        }
    }
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub name: String,

    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default = "default_fps")]
    pub fps: f64,

    /// Project length in seconds.
    pub duration: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROJECT_NAME.to_string(),
            resolution: Resolution::default(),
            fps: DEFAULT_FPS,
            duration: DEFAULT_PROJECT_DURATION,
        }
    }
}

/// The content half of a project; the unit undo/redo records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default)]
    pub project_settings: ProjectSettings,

    #[serde(default)]
    pub asset_library: Vec<Asset>,

    #[serde(default)]
    pub timeline: Timeline,
}

impl ProjectDocument {
    pub fn asset(&self, asset_id: &str) -> Option<&Asset> {
        self.asset_library.iter().find(|a| a.asset_id == asset_id)
    }

    /// Clips placed from the given asset.
    pub fn clips_referencing<'a>(&'a self, asset_id: &'a str) -> impl Iterator<Item = &'a Clip> {
        self.timeline.clips().filter(move |c| c.asset_id == asset_id)
    }

    /// Ids of clips whose asset is no longer in the library.
    pub fn dangling_clip_ids(&self) -> Vec<String> {
        self.timeline
            .clips()
            .filter(|c| self.asset(&c.asset_id).is_none())
            .map(|c| c.clip_id.clone())
            .collect()
    }
}

/// Ephemeral editor state kept out of history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(flatten)]
    pub selection: Selection,

    /// Playhead position in seconds.
    #[serde(default)]
    pub current_time: f64,

    #[serde(default)]
    pub is_playing: bool,

    #[serde(default = "default_timeline_scale")]
    pub timeline_scale: f64,
}

fn default_timeline_scale() -> f64 {
    DEFAULT_TIMELINE_SCALE
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            current_time: 0.0,
            is_playing: false,
            timeline_scale: DEFAULT_TIMELINE_SCALE,
        }
    }
}

impl ViewState {
    /// Bring values read from outside back within their invariants.
    pub fn sanitize(&mut self) {
        self.current_time = clamp_current_time(self.current_time);
        self.timeline_scale = clamp_timeline_scale(self.timeline_scale);
        self.selection.normalize();
    }
}

/// Playhead clamp. Non-finite times fall back to zero since they cannot be
/// stored as JSON numbers.
pub fn clamp_current_time(time: f64) -> f64 {
    if !time.is_finite() {
        0.0
    } else {
        time.max(0.0)
    }
}

pub fn clamp_timeline_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        DEFAULT_TIMELINE_SCALE
    } else {
        scale.clamp(MIN_TIMELINE_SCALE, MAX_TIMELINE_SCALE)
    }
}

/// Full project as persisted: content plus view state in one flat object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(flatten)]
    pub document: ProjectDocument,

    #[serde(flatten)]
    pub view: ViewState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::asset::AssetType;
    use crate::model::timeline::TrackType;
    use test_case::test_case;

    #[test]
    fn test_canonical_default() {
        let doc = ProjectDocument::default();
        assert_eq!(doc.project_settings.name, "Untitled Project");
        assert_eq!(doc.project_settings.resolution, Resolution::FullHd);
        assert_eq!(doc.project_settings.fps, 30.0);
        assert_eq!(doc.project_settings.duration, 60.0);
        assert!(doc.asset_library.is_empty());
        assert_eq!(doc.timeline.video_tracks.len(), 1);
        assert_eq!(doc.timeline.audio_tracks.len(), 1);
    }

    #[test]
    fn test_snapshot_json_is_flat() {
        let snapshot = ProjectSnapshot::default();
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["projectSettings"]["resolution"], "1080p");
        assert_eq!(value["timelineScale"], 50.0);
        assert_eq!(value["selectedClipId"], serde_json::Value::Null);
        assert!(value["timeline"]["videoTracks"].is_array());
        assert!(value.get("document").is_none());

        let back: ProjectSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_4k_resolution_name() {
        let json = r#"{"name":"Promo","resolution":"4K","duration":30}"#;
        let settings: ProjectSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.resolution, Resolution::Uhd4k);
        assert_eq!(settings.fps, 30.0);
        assert_eq!(settings.resolution.dimensions(), (3840, 2160));
    }

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("4K".parse::<Resolution>().unwrap(), Resolution::Uhd4k);
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::FullHd);
        assert!("720p".parse::<Resolution>().is_err());
    }

    #[test_case(-5.0, 10.0 ; "below range")]
    #[test_case(10.0, 10.0 ; "lower bound")]
    #[test_case(75.0, 75.0 ; "inside range")]
    #[test_case(200.0, 200.0 ; "upper bound")]
    #[test_case(900.0, 200.0 ; "above range")]
    fn test_clamp_timeline_scale(input: f64, expected: f64) {
        assert_eq!(clamp_timeline_scale(input), expected);
    }

    #[test_case(-1.0, 0.0 ; "negative")]
    #[test_case(0.0, 0.0 ; "zero")]
    #[test_case(12.5, 12.5 ; "positive")]
    #[test_case(f64::INFINITY, 0.0 ; "infinite")]
    #[test_case(f64::NAN, 0.0 ; "nan")]
    fn test_clamp_current_time(input: f64, expected: f64) {
        assert_eq!(clamp_current_time(input), expected);
    }

    #[test]
    fn test_sanitize_restores_selection_invariant() {
        let mut view: ViewState = serde_json::from_value(serde_json::json!({
            "selectedClipId": "stale",
            "selectedClipIds": ["a", "a"],
            "currentTime": -3.0,
            "isPlaying": true,
            "timelineScale": 1000.0
        }))
        .unwrap();
        view.sanitize();

        assert_eq!(view.selection.ids(), ["a".to_string()]);
        assert_eq!(view.selection.primary(), Some("a"));
        assert_eq!(view.current_time, 0.0);
        assert_eq!(view.timeline_scale, 200.0);
    }

    #[test]
    fn test_dangling_clip_ids() {
        let mut doc = ProjectDocument::default();
        doc.asset_library
            .push(Asset::with_id("kept", "a.png", AssetType::Image));
        let mut live = Clip::new("kept", 0.0, 1.0);
        live.clip_id = "live".to_string();
        let mut orphan = Clip::new("gone", 0.0, 1.0);
        orphan.clip_id = "orphan".to_string();
        doc.timeline.push_clip(TrackType::Video, 0, live);
        doc.timeline.push_clip(TrackType::Video, 0, orphan);

        assert_eq!(doc.dangling_clip_ids(), vec!["orphan".to_string()]);
        assert_eq!(doc.clips_referencing("kept").count(), 1);
    }
}
