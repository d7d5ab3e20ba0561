//! Clip placements on the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Duration given to clips whose asset has no intrinsic length (stills).
pub const DEFAULT_CLIP_DURATION: f64 = 5.0;

/// Entry/exit animation applied to a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipAnimation {
    /// Animation name, e.g. "fadeIn" or "kenBurns".
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Transition into the clip from whatever precedes it on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipTransition {
    #[serde(rename = "type")]
    pub kind: String,

    pub duration: f64,
}

/// Text drawn over a clip. Times are relative to the clip start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub start_time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Normalized horizontal position (0 = left, 1 = right).
    #[serde(default = "centered")]
    pub x: f64,

    /// Normalized vertical position (0 = top, 1 = bottom).
    #[serde(default = "centered")]
    pub y: f64,

    #[serde(default = "default_font_size")]
    pub font_size: f64,

    #[serde(default = "default_color")]
    pub color: String,
}

fn centered() -> f64 {
    0.5
}

fn default_font_size() -> f64 {
    48.0
}

fn default_color() -> String {
    "#ffffff".to_string()
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            start_time: 0.0,
            duration: None,
            x: centered(),
            y: centered(),
            font_size: default_font_size(),
            color: default_color(),
        }
    }

    /// Reset non-finite numbers to their defaults.
    fn sanitize(&mut self) {
        if !self.start_time.is_finite() {
            self.start_time = 0.0;
        }
        self.duration = self.duration.filter(|d| d.is_finite());
        if !self.x.is_finite() {
            self.x = centered();
        }
        if !self.y.is_finite() {
            self.y = centered();
        }
        if !self.font_size.is_finite() {
            self.font_size = default_font_size();
        }
    }
}

fn default_volume() -> f64 {
    1.0
}

/// A timed placement of an asset on a track.
///
/// `asset_id` is a weak reference; the asset may have been removed from the
/// library since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub clip_id: String,

    pub asset_id: String,

    /// Position on the timeline in seconds, never negative.
    pub start_time: f64,

    /// Length in seconds, always positive.
    pub duration: f64,

    /// Gain in `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<ClipAnimation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<ClipTransition>,

    #[serde(default)]
    pub text_overlays: Vec<TextOverlay>,
}

impl Clip {
    /// Create a clip with a fresh UUID, full volume and no overlays.
    pub fn new(asset_id: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self {
            clip_id: Uuid::new_v4().to_string(),
            asset_id: asset_id.into(),
            start_time: start_time.max(0.0),
            duration,
            volume: 1.0,
            animation: None,
            transition: None,
            text_overlays: Vec::new(),
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// True when `time` falls strictly inside the clip, so a cut there
    /// leaves two non-empty halves.
    pub fn contains_strictly(&self, time: f64) -> bool {
        time > self.start_time && time < self.end_time()
    }

    /// Cut at `time`, giving both halves new ids. `None` when `time` is not
    /// strictly inside the clip.
    pub fn split_at(&self, time: f64) -> Option<(Clip, Clip)> {
        if !self.contains_strictly(time) {
            return None;
        }

        let mut first = self.clone();
        first.clip_id = Uuid::new_v4().to_string();
        first.duration = time - self.start_time;

        let mut second = self.clone();
        second.clip_id = Uuid::new_v4().to_string();
        second.start_time = time;
        second.duration = self.end_time() - time;

        Some((first, second))
    }
}

/// Merge-patch for [`Clip`]. `None` leaves a field untouched.
///
/// Values that would break a clip invariant are coerced: negative start
/// times clamp to zero, volume clamps to `[0, 1]`, and a non-positive or
/// non-finite duration is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPatch {
    pub asset_id: Option<String>,
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub volume: Option<f64>,
    pub animation: Option<Option<ClipAnimation>>,
    pub transition: Option<Option<ClipTransition>>,
    pub text_overlays: Option<Vec<TextOverlay>>,
}

impl ClipPatch {
    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }

    pub fn start_time(start_time: f64) -> Self {
        Self {
            start_time: Some(start_time),
            ..Default::default()
        }
    }

    pub fn apply(&self, clip: &mut Clip) {
        if let Some(asset_id) = &self.asset_id {
            clip.asset_id = asset_id.clone();
        }
        if let Some(start) = self.start_time.filter(|s| s.is_finite()) {
            clip.start_time = start.max(0.0);
        }
        if let Some(duration) = self.duration.filter(|d| d.is_finite() && *d > 0.0) {
            clip.duration = duration;
        }
        if let Some(volume) = self.volume.filter(|v| !v.is_nan()) {
            clip.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(animation) = &self.animation {
            clip.animation = animation.clone().map(|mut a| {
                a.duration = a.duration.filter(|d| d.is_finite());
                a
            });
        }
        if let Some(transition) = &self.transition {
            clip.transition = transition.clone().filter(|t| t.duration.is_finite());
        }
        if let Some(overlays) = &self.text_overlays {
            clip.text_overlays = overlays.clone();
            clip.text_overlays.iter_mut().for_each(TextOverlay::sanitize);
        }
    }
}
