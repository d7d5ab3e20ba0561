//! Asset library records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media kind of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Audio,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Image => write!(f, "image"),
            AssetType::Video => write!(f, "video"),
            AssetType::Audio => write!(f, "audio"),
        }
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(AssetType::Image),
            "video" => Ok(AssetType::Video),
            "audio" => Ok(AssetType::Audio),
            other => Err(format!("unknown asset type: {other}")),
        }
    }
}

/// A media item clips can point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: String,

    pub file_name: String,

    #[serde(rename = "type")]
    pub asset_type: AssetType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Sprite sheet of evenly spaced frames for timeline previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filmstrip_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filmstrip_frame_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filmstrip_frame_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filmstrip_frame_height: Option<u32>,

    /// Media length in seconds. Still images usually have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Stand-in for media that has not been generated or uploaded yet.
    #[serde(default)]
    pub is_placeholder: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_description: Option<String>,
}

impl Asset {
    /// Create an asset with a fresh UUID.
    pub fn new(file_name: impl Into<String>, asset_type: AssetType) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), file_name, asset_type)
    }

    /// Create an asset with a caller-chosen id.
    pub fn with_id(
        asset_id: impl Into<String>,
        file_name: impl Into<String>,
        asset_type: AssetType,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            file_name: file_name.into(),
            asset_type,
            source_url: None,
            thumbnail_url: None,
            filmstrip_url: None,
            filmstrip_frame_count: None,
            filmstrip_frame_width: None,
            filmstrip_frame_height: None,
            duration: None,
            is_placeholder: false,
            placeholder_description: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Drop a non-finite duration. NaN never compares equal to itself, and
    /// neither NaN nor infinity survives a JSON round trip.
    pub fn sanitize(&mut self) {
        self.duration = self.duration.filter(|d| d.is_finite());
    }

    /// Mark as a placeholder awaiting real media.
    pub fn placeholder(mut self, description: impl Into<String>) -> Self {
        self.is_placeholder = true;
        self.placeholder_description = Some(description.into());
        self
    }
}

/// Merge-patch for [`Asset`]. `None` leaves a field untouched.
///
/// Fields that are optional on the asset take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub file_name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub source_url: Option<Option<String>>,
    pub thumbnail_url: Option<Option<String>>,
    pub filmstrip_url: Option<Option<String>>,
    pub filmstrip_frame_count: Option<Option<u32>>,
    pub filmstrip_frame_width: Option<Option<u32>>,
    pub filmstrip_frame_height: Option<Option<u32>>,
    pub duration: Option<Option<f64>>,
    pub is_placeholder: Option<bool>,
    pub placeholder_description: Option<Option<String>>,
}

impl AssetPatch {
    pub fn apply(&self, asset: &mut Asset) {
        if let Some(name) = &self.file_name {
            asset.file_name = name.clone();
        }
        if let Some(kind) = self.asset_type {
            asset.asset_type = kind;
        }
        if let Some(url) = &self.source_url {
            asset.source_url = url.clone();
        }
        if let Some(url) = &self.thumbnail_url {
            asset.thumbnail_url = url.clone();
        }
        if let Some(url) = &self.filmstrip_url {
            asset.filmstrip_url = url.clone();
        }
        if let Some(count) = self.filmstrip_frame_count {
            asset.filmstrip_frame_count = count;
        }
        if let Some(width) = self.filmstrip_frame_width {
            asset.filmstrip_frame_width = width;
        }
        if let Some(height) = self.filmstrip_frame_height {
            asset.filmstrip_frame_height = height;
        }
        if let Some(duration) = self.duration {
            asset.duration = duration;
        }
        asset.sanitize();
        if let Some(flag) = self.is_placeholder {
            asset.is_placeholder = flag;
        }
        if let Some(description) = &self.placeholder_description {
            asset.placeholder_description = description.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assets_get_distinct_ids() {
        let a = Asset::new("a.mp4", AssetType::Video);
        let b = Asset::new("a.mp4", AssetType::Video);
        assert_ne!(a.asset_id, b.asset_id);
        assert!(!a.is_placeholder);
    }

    #[test]
    fn test_json_shape() {
        let asset = Asset::with_id("a1", "song.wav", AssetType::Audio).with_duration(12.5);
        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["assetId"], "a1");
        assert_eq!(value["fileName"], "song.wav");
        assert_eq!(value["type"], "audio");
        assert_eq!(value["isPlaceholder"], false);
        assert!(value.get("thumbnailUrl").is_none());
    }

    #[test]
    fn test_is_placeholder_defaults_to_false() {
        let asset: Asset =
            serde_json::from_str(r#"{"assetId":"x","fileName":"x.png","type":"image"}"#).unwrap();
        assert!(!asset.is_placeholder);
        assert_eq!(asset.duration, None);
    }

    #[test]
    fn test_patch_drops_non_finite_duration() {
        let mut asset = Asset::with_id("a1", "clip.mp4", AssetType::Video).with_duration(3.0);
        let patch = AssetPatch {
            duration: Some(Some(f64::NAN)),
            ..Default::default()
        };
        patch.apply(&mut asset);
        assert_eq!(asset.duration, None);
        assert_eq!(asset, asset.clone());
    }

    #[test]
    fn test_patch_sets_and_clears() {
        let mut asset = Asset::with_id("a1", "clip.mp4", AssetType::Video)
            .with_source_url("https://cdn/clip.mp4")
            .placeholder("b-roll of a beach");
        let patch = AssetPatch {
            file_name: Some("beach.mp4".to_string()),
            source_url: Some(None),
            is_placeholder: Some(false),
            ..Default::default()
        };
        patch.apply(&mut asset);

        assert_eq!(asset.file_name, "beach.mp4");
        assert_eq!(asset.source_url, None);
        assert!(!asset.is_placeholder);
        assert_eq!(
            asset.placeholder_description.as_deref(),
            Some("b-roll of a beach")
        );
    }

    #[test]
    fn test_asset_type_parse() {
        assert_eq!("Video".parse::<AssetType>().unwrap(), AssetType::Video);
        assert!("gif".parse::<AssetType>().is_err());
    }
}
