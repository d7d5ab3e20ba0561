//! CLI Command Implementations
//!
//! Every editing command opens a session on the stored project, applies one
//! store command and writes the result back.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::SpliceConfig;
use crate::error::SpliceError;
use crate::model::{Asset, AssetType, ProjectSnapshot, Resolution, TrackType, MAX_TRACKS};
use crate::state::{
    FileGateway, LoadOutcome, PersistenceGateway, ProjectStore, Session, DEFAULT_PROJECT_ID,
};

/// Create a new empty project and save it.
pub async fn new_project(
    config: &SpliceConfig,
    name: &str,
    resolution: Resolution,
    fps: f64,
) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 {
        bail!("fps must be positive, got {fps}");
    }
    let id = config.project_id.as_deref().unwrap_or(DEFAULT_PROJECT_ID);
    let gateway = FileGateway::with_project(&config.storage_dir, id)?;
    if gateway.project_path(id).exists() {
        warn!(project = id, "Overwriting existing project");
    }

    let mut project = ProjectSnapshot::default();
    project.document.project_settings.name = name.to_string();
    project.document.project_settings.resolution = resolution;
    project.document.project_settings.fps = fps;
    gateway.save(&project).await?;

    info!(project = id, "Created project");
    println!("Project created: {} ({})", name, gateway.project_path(id).display());
    Ok(())
}

/// Print the stored project.
pub async fn show(config: &SpliceConfig, json: bool) -> Result<()> {
    let session = open(config).await?;
    let store = session.store();

    if json {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        return session.close().await.map(|_| ()).map_err(Into::into);
    }

    let doc = store.document();
    let settings = &doc.project_settings;
    println!("{}", settings.name);
    println!(
        "  {} @ {} fps, {:.1}s",
        settings.resolution, settings.fps, settings.duration
    );
    println!("{:-<60}", "");

    println!("Assets ({}):", doc.asset_library.len());
    for asset in &doc.asset_library {
        let duration = asset
            .duration
            .map(|d| format!("{d:.2}s"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:<6} {:>8}  {}",
            asset.asset_id, asset.asset_type, duration, asset.file_name
        );
    }

    for track_type in [TrackType::Video, TrackType::Audio] {
        for (index, track) in doc.timeline.tracks(track_type).iter().enumerate() {
            println!("{} track {} ({} clips):", track_type, index, track.len());
            for clip in track {
                let marker = if store.is_selected(&clip.clip_id) { "*" } else { " " };
                println!(
                    " {} {}  {:>7.2}s - {:>7.2}s  vol {:.2}  asset {}",
                    marker,
                    clip.clip_id,
                    clip.start_time,
                    clip.end_time(),
                    clip.volume,
                    clip.asset_id
                );
            }
        }
    }

    let dangling = doc.dangling_clip_ids();
    if !dangling.is_empty() {
        println!("\n--- Warnings ---");
        for clip_id in dangling {
            println!("Clip {clip_id} refers to a missing asset");
        }
    }

    session.close().await?;
    Ok(())
}

pub async fn add_asset(
    config: &SpliceConfig,
    file_name: &str,
    asset_type: AssetType,
    duration: Option<f64>,
    url: Option<&str>,
) -> Result<()> {
    let mut asset = Asset::new(file_name, asset_type);
    if let Some(duration) = duration {
        asset = asset.with_duration(duration);
    }
    if let Some(url) = url {
        asset = asset.with_source_url(url);
    }
    let asset_id = asset.asset_id.clone();

    edit(config, |store| {
        store.add_asset(asset);
        Ok(())
    })
    .await?;

    println!("Asset added: {asset_id}");
    Ok(())
}

pub async fn add_clip(
    config: &SpliceConfig,
    asset_id: &str,
    start: f64,
    track: TrackType,
    track_index: usize,
) -> Result<()> {
    let clip_id = edit(config, |store| {
        let asset = store
            .asset(asset_id)
            .cloned()
            .with_context(|| format!("no asset with id {asset_id}"))?;
        store
            .add_clip_to_timeline(&asset, start, track, track_index)
            .with_context(|| {
                format!(
                    "cannot place clip at {start}s on {track} track {track_index} (at most {MAX_TRACKS} tracks)"
                )
            })
    })
    .await?;

    println!("Clip added: {clip_id}");
    Ok(())
}

pub async fn split(config: &SpliceConfig, clip_id: &str, time: f64) -> Result<()> {
    let first = edit(config, |store| {
        let clip = store
            .clip(clip_id)
            .with_context(|| format!("no clip with id {clip_id}"))?;
        if !clip.contains_strictly(time) {
            bail!(
                "split time {time} is outside clip {clip_id} ({} - {})",
                clip.start_time,
                clip.end_time()
            );
        }
        store.split_clip(clip_id, time);
        store
            .selection()
            .primary()
            .map(str::to_string)
            .context("split produced no selection")
    })
    .await?;

    println!("Clip split; first half: {first}");
    Ok(())
}

pub async fn remove_clip(config: &SpliceConfig, clip_id: &str) -> Result<()> {
    edit(config, |store| {
        if store.clip(clip_id).is_none() {
            bail!("no clip with id {clip_id}");
        }
        store.remove_clip(clip_id);
        Ok(())
    })
    .await?;

    println!("Clip removed: {clip_id}");
    Ok(())
}

pub async fn remove_asset(config: &SpliceConfig, asset_id: &str) -> Result<()> {
    let dangling = edit(config, |store| {
        if store.asset(asset_id).is_none() {
            bail!("no asset with id {asset_id}");
        }
        store.remove_asset(asset_id);
        Ok(store.document().dangling_clip_ids().len())
    })
    .await?;

    println!("Asset removed: {asset_id}");
    if dangling > 0 {
        println!("WARNING: {dangling} clip(s) now refer to a missing asset");
    }
    Ok(())
}

/// Open the configured project. Fails if nothing is stored.
async fn open(config: &SpliceConfig) -> Result<Session> {
    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(&config.storage_dir));
    let store = ProjectStore::with_history_capacity(config.history_capacity);

    // One-shot commands save explicitly
    let session_config = SpliceConfig {
        autosave_enabled: false,
        ..config.clone()
    };
    let session = Session::open(store, gateway, &session_config).await;

    match session.load_outcome() {
        LoadOutcome::Loaded => Ok(session),
        LoadOutcome::Empty => {
            let err = SpliceError::ProjectNotFound {
                id: config
                    .project_id
                    .clone()
                    .unwrap_or_else(|| config.storage_dir.display().to_string()),
            };
            let hint = err.recovery_suggestion().unwrap_or_default();
            Err(anyhow::Error::new(err).context(hint))
        }
        LoadOutcome::Failed => bail!("failed to load project; see log for details"),
        LoadOutcome::Unsupported => bail!(
            "storage directory {} is not usable",
            config.storage_dir.display()
        ),
    }
}

/// Load, apply `f` to the store and save.
async fn edit<T>(
    config: &SpliceConfig,
    f: impl FnOnce(&mut ProjectStore) -> Result<T>,
) -> Result<T> {
    let mut session = open(config).await?;
    let result = f(session.store_mut())?;

    if let Some(label) = session.store().undo_label() {
        info!(edit = label, "Applied edit");
    }
    session.save_now().await?;
    session.close().await?;
    Ok(result)
}
