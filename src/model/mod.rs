//! Document model: assets, clips, the timeline and the project around them.

pub mod asset;
pub mod clip;
pub mod project;
pub mod selection;
pub mod timeline;

pub use asset::{Asset, AssetPatch, AssetType};
pub use clip::{Clip, ClipAnimation, ClipPatch, ClipTransition, TextOverlay, DEFAULT_CLIP_DURATION};
pub use project::{
    ProjectDocument, ProjectSettings, ProjectSnapshot, Resolution, ViewState,
    MAX_TIMELINE_SCALE, MIN_TIMELINE_SCALE,
};
pub use selection::Selection;
pub use timeline::{ClipLocation, Timeline, Track, TrackList, TrackType, MAX_TRACKS};
