//! A store wired to persistence.
//!
//! Opening a session loads the stored project (if any) into the store, and
//! only then arms autosave. Edits made before the load finishes can never
//! overwrite stored work with a default project.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::SpliceConfig;
use crate::error::Result;
use crate::state::autosave::Autosaver;
use crate::state::gateway::PersistenceGateway;
use crate::state::store::{ChangeKind, ProjectStore, SubscriptionId};

/// What happened when the session tried to load a stored project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The gateway does not work here; persistence is off.
    Unsupported,
    /// Nothing stored yet; the store keeps its current project.
    Empty,
    Loaded,
    /// The load failed; the store keeps its current project.
    Failed,
}

pub struct Session {
    store: ProjectStore,
    gateway: Arc<dyn PersistenceGateway>,
    autosaver: Option<Autosaver>,
    subscription: Option<SubscriptionId>,
    load_outcome: LoadOutcome,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("autosave_armed", &self.is_autosave_armed())
            .field("load_outcome", &self.load_outcome)
            .finish()
    }
}

impl Session {
    /// Load the configured project into `store` and arm autosave.
    ///
    /// Load errors are logged, not returned: the session then runs on the
    /// store's current project and autosave still arms, so the next edit
    /// is written back.
    pub async fn open(
        mut store: ProjectStore,
        gateway: Arc<dyn PersistenceGateway>,
        config: &SpliceConfig,
    ) -> Self {
        if !gateway.is_supported() {
            warn!("Persistence unavailable; running without saving");
            return Self {
                store,
                gateway,
                autosaver: None,
                subscription: None,
                load_outcome: LoadOutcome::Unsupported,
            };
        }

        let load_outcome = match gateway.load(config.project_id.as_deref()).await {
            Ok(Some(snapshot)) => {
                store.hydrate(snapshot);
                info!(
                    name = %store.document().project_settings.name,
                    "Restored project"
                );
                LoadOutcome::Loaded
            }
            Ok(None) => {
                info!("No stored project; starting fresh");
                LoadOutcome::Empty
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "Failed to load project");
                LoadOutcome::Failed
            }
        };

        let mut session = Self {
            store,
            gateway,
            autosaver: None,
            subscription: None,
            load_outcome,
        };
        if config.autosave_enabled {
            session.arm_autosave(config);
        }
        session
    }

    fn arm_autosave(&mut self, config: &SpliceConfig) {
        let autosaver = Autosaver::spawn(Arc::clone(&self.gateway), config.autosave_delay());
        let handle = autosaver.handle();
        let subscription = self.store.subscribe(move |event| {
            if !event.content_changed() || event.kind == ChangeKind::Hydrate {
                return;
            }
            if let Err(e) = handle.schedule(event.snapshot()) {
                warn!(error = %e, "Dropped autosave");
            }
        });
        self.autosaver = Some(autosaver);
        self.subscription = Some(subscription);
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProjectStore {
        &mut self.store
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    pub fn is_autosave_armed(&self) -> bool {
        self.autosaver.is_some()
    }

    /// Write the current project immediately, bypassing the debounce.
    pub async fn save_now(&self) -> Result<()> {
        self.gateway.save(&self.store.snapshot()).await
    }

    /// Write any pending autosave now.
    pub async fn flush(&self) -> Result<()> {
        match &self.autosaver {
            Some(autosaver) => autosaver.flush().await,
            None => Ok(()),
        }
    }

    /// Flush pending work, stop autosave and hand back the store.
    pub async fn close(mut self) -> Result<ProjectStore> {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
        if let Some(autosaver) = self.autosaver.take() {
            autosaver.shutdown().await?;
        }
        Ok(self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Asset, AssetType, ProjectSnapshot};
    use crate::state::gateway::{MemoryGateway, DEFAULT_PROJECT_ID};
    use std::time::Duration;
    use tokio::time::sleep;

    fn stored_project() -> ProjectSnapshot {
        let mut project = ProjectSnapshot::default();
        project.document.project_settings.name = "Stored".to_string();
        project
    }

    async fn open_with(gateway: &Arc<MemoryGateway>) -> Session {
        let dyn_gateway: Arc<dyn PersistenceGateway> = gateway.clone();
        Session::open(ProjectStore::new(), dyn_gateway, &SpliceConfig::default()).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_hydrates_without_saving() {
        let gateway = Arc::new(MemoryGateway::new().with_project(DEFAULT_PROJECT_ID, stored_project()));
        let session = open_with(&gateway).await;

        assert_eq!(session.load_outcome(), LoadOutcome::Loaded);
        assert_eq!(session.store().document().project_settings.name, "Stored");
        assert!(!session.store().can_undo());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_is_autosaved() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open_with(&gateway).await;
        assert_eq!(session.load_outcome(), LoadOutcome::Empty);

        session
            .store_mut()
            .add_asset(Asset::new("a.mp4", AssetType::Video));
        sleep(Duration::from_secs(1)).await;

        assert_eq!(gateway.save_count(), 1);
        let saved = gateway.stored(DEFAULT_PROJECT_ID).unwrap();
        assert_eq!(saved.document.asset_library.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_changes_are_not_autosaved() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open_with(&gateway).await;

        session.store_mut().set_current_time(4.0);
        session.store_mut().set_timeline_scale(80.0);
        sleep(Duration::from_secs(1)).await;

        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_still_arms_autosave() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.set_fail_loads(true);
        let mut session = open_with(&gateway).await;

        assert_eq!(session.load_outcome(), LoadOutcome::Failed);
        assert!(session.is_autosave_armed());

        session
            .store_mut()
            .add_asset(Asset::new("b.wav", AssetType::Audio));
        session.flush().await.unwrap();
        assert_eq!(gateway.save_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_gateway_skips_persistence() {
        let gateway = Arc::new(MemoryGateway::unsupported());
        let mut session = open_with(&gateway).await;

        assert_eq!(session.load_outcome(), LoadOutcome::Unsupported);
        assert!(!session.is_autosave_armed());

        session
            .store_mut()
            .add_asset(Asset::new("c.png", AssetType::Image));
        let store = session.close().await.unwrap();
        assert_eq!(store.document().asset_library.len(), 1);
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_save() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut session = open_with(&gateway).await;

        session
            .store_mut()
            .add_asset(Asset::new("d.mp4", AssetType::Video));
        session.close().await.unwrap();

        assert_eq!(gateway.save_count(), 1);
    }
}
