//! Persistence Tests
//!
//! Sessions over real gateways: startup load, the autosave gate and
//! debounced writes.

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::sleep;

use splice::state::{FileGateway, LoadOutcome, MemoryGateway, DEFAULT_PROJECT_ID};
use splice::{
    Asset, AssetType, PersistenceGateway, ProjectSnapshot, ProjectStore, Session, SpliceConfig,
};

fn config_for(dir: &std::path::Path, project: Option<&str>) -> SpliceConfig {
    SpliceConfig {
        storage_dir: dir.to_path_buf(),
        project_id: project.map(str::to_string),
        ..SpliceConfig::default()
    }
}

#[tokio::test]
async fn test_file_session_round_trip() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), Some("reel"));

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
    let mut session = Session::open(ProjectStore::new(), gateway, &config).await;
    assert_eq!(session.load_outcome(), LoadOutcome::Empty);

    let asset = Asset::new("intro.mp4", AssetType::Video).with_duration(8.0);
    let clip_id = session.store_mut().batch("Import", |store| {
        store.add_asset(asset.clone());
        store.add_clip(&asset, 1.0).unwrap()
    });
    session.store_mut().set_selected_clip_id(Some(&clip_id));
    session.close().await.unwrap();

    assert!(dir.path().join("reel.json").exists());

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
    let reopened = Session::open(ProjectStore::new(), gateway, &config).await;
    assert_eq!(reopened.load_outcome(), LoadOutcome::Loaded);

    let store = reopened.store();
    assert_eq!(store.document().asset_library.len(), 1);
    assert_eq!(store.clip(&clip_id).unwrap().start_time, 1.0);
    assert!(!store.can_undo());
}

#[tokio::test]
async fn test_view_only_changes_are_not_written() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path(), Some("quiet"));

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
    let mut session = Session::open(ProjectStore::new(), gateway, &config).await;
    session.store_mut().set_current_time(12.0);
    session.store_mut().set_playing(true);
    session.close().await.unwrap();

    assert!(!dir.path().join("quiet.json").exists());
}

#[tokio::test]
async fn test_non_finite_edits_still_save_a_loadable_project() {
    let dir = tempdir().unwrap();
    let gateway = FileGateway::with_project(dir.path(), "edge").unwrap();

    let mut store = ProjectStore::new();
    let asset = Asset::new("loop.wav", AssetType::Audio).with_duration(f64::NAN);
    store.add_asset(asset.clone());
    let clip_id = store.add_clip(&asset, 2.0).unwrap();
    assert!(store.add_clip(&asset, f64::INFINITY).is_none());
    store.set_selected_clip_id(Some(&clip_id));
    store.move_selected_clips(f64::INFINITY);
    store.set_current_time(f64::INFINITY);
    store.set_timeline_scale(f64::NAN);

    let snapshot = store.snapshot();
    gateway.save(&snapshot).await.unwrap();

    let loaded = gateway.load(Some("edge")).await.unwrap();
    assert_eq!(loaded, Some(snapshot));
}

#[tokio::test]
async fn test_corrupt_file_keeps_default_project() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let config = config_for(dir.path(), Some("broken"));

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
    let session = Session::open(ProjectStore::new(), gateway, &config).await;

    assert_eq!(session.load_outcome(), LoadOutcome::Failed);
    assert_eq!(session.store().snapshot(), ProjectSnapshot::default());
    assert!(session.is_autosave_armed());
}

#[tokio::test]
async fn test_unnamed_open_picks_latest_project() {
    let dir = tempdir().unwrap();

    let seeded = FileGateway::with_project(dir.path(), "latest").unwrap();
    let mut project = ProjectSnapshot::default();
    project.document.project_settings.name = "Latest".to_string();
    seeded.save(&project).await.unwrap();

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
    let session = Session::open(ProjectStore::new(), gateway, &config_for(dir.path(), None)).await;

    assert_eq!(session.load_outcome(), LoadOutcome::Loaded);
    assert_eq!(session.store().document().project_settings.name, "Latest");
}

#[tokio::test(start_paused = true)]
async fn test_edit_burst_saves_once_after_quiet_period() {
    let gateway = Arc::new(MemoryGateway::new());
    let dyn_gateway: Arc<dyn PersistenceGateway> = gateway.clone();
    let mut session = Session::open(ProjectStore::new(), dyn_gateway, &SpliceConfig::default()).await;

    for i in 0..5 {
        session
            .store_mut()
            .add_asset(Asset::new(format!("take-{i}.wav"), AssetType::Audio));
        sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(gateway.save_count(), 0);

    sleep(Duration::from_millis(600)).await;
    assert_eq!(gateway.save_count(), 1);

    let saved = gateway.stored(DEFAULT_PROJECT_ID).unwrap();
    assert_eq!(saved.document.asset_library.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_undo_is_autosaved() {
    let gateway = Arc::new(MemoryGateway::new());
    let dyn_gateway: Arc<dyn PersistenceGateway> = gateway.clone();
    let mut session = Session::open(ProjectStore::new(), dyn_gateway, &SpliceConfig::default()).await;

    session
        .store_mut()
        .add_asset(Asset::new("a.png", AssetType::Image));
    session.flush().await.unwrap();
    session.store_mut().undo();
    session.flush().await.unwrap();

    assert_eq!(gateway.save_count(), 2);
    let saved = gateway.stored(DEFAULT_PROJECT_ID).unwrap();
    assert!(saved.document.asset_library.is_empty());
}

#[tokio::test]
async fn test_failed_save_leaves_store_intact() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.set_fail_saves(true);
    let dyn_gateway: Arc<dyn PersistenceGateway> = gateway.clone();
    let mut session = Session::open(ProjectStore::new(), dyn_gateway, &SpliceConfig::default()).await;

    session
        .store_mut()
        .add_asset(Asset::new("b.mp4", AssetType::Video));
    session.flush().await.unwrap();

    assert_eq!(gateway.save_count(), 0);
    assert_eq!(session.store().document().asset_library.len(), 1);
    assert!(session.store().can_undo());
}
