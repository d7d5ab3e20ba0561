//! Persistence gateway boundary.
//!
//! The store never touches storage itself. Durable save/load goes through a
//! [`PersistenceGateway`]; [`MemoryGateway`] is the in-process implementation
//! used for headless sessions and tests, and
//! [`FileGateway`](crate::state::storage::FileGateway) writes JSON files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, SpliceError};
use crate::model::ProjectSnapshot;

/// Id used when a gateway is asked for a project without naming one.
pub const DEFAULT_PROJECT_ID: &str = "default";

/// Durable storage for whole projects.
///
/// `save` always receives a complete snapshot, so writes are idempotent and
/// the last one wins.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Whether this gateway can work in the current environment. When false
    /// the caller skips persistence entirely.
    fn is_supported(&self) -> bool;

    /// Load a project, or the gateway's default project when `project_id`
    /// is `None`. `Ok(None)` means nothing is stored yet.
    async fn load(&self, project_id: Option<&str>) -> Result<Option<ProjectSnapshot>>;

    async fn save(&self, project: &ProjectSnapshot) -> Result<()>;
}

/// Gateway keeping projects in memory.
#[derive(Debug)]
pub struct MemoryGateway {
    supported: bool,
    active_id: Mutex<String>,
    projects: Mutex<HashMap<String, ProjectSnapshot>>,
    save_count: AtomicUsize,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            supported: true,
            active_id: Mutex::new(DEFAULT_PROJECT_ID.to_string()),
            projects: Mutex::new(HashMap::new()),
            save_count: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
        }
    }

    /// A gateway that reports itself as unsupported.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Seed a stored project.
    pub fn with_project(self, project_id: &str, project: ProjectSnapshot) -> Self {
        if let Ok(mut projects) = self.projects.lock() {
            projects.insert(project_id.to_string(), project);
        }
        self
    }

    /// Make every following `save` fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every following `load` fail.
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// The stored copy of a project.
    pub fn stored(&self, project_id: &str) -> Option<ProjectSnapshot> {
        self.projects
            .lock()
            .ok()
            .and_then(|projects| projects.get(project_id).cloned())
    }

    fn active_id(&self) -> String {
        self.active_id
            .lock()
            .map(|id| id.clone())
            .unwrap_or_else(|_| DEFAULT_PROJECT_ID.to_string())
    }

    fn poisoned() -> SpliceError {
        SpliceError::PersistenceUnavailable {
            reason: "memory gateway lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn load(&self, project_id: Option<&str>) -> Result<Option<ProjectSnapshot>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(SpliceError::PersistenceUnavailable {
                reason: "load failure injected".to_string(),
            });
        }
        let id = match project_id {
            Some(id) => id.to_string(),
            None => self.active_id(),
        };
        let project = self
            .projects
            .lock()
            .map_err(|_| Self::poisoned())?
            .get(&id)
            .cloned();
        *self.active_id.lock().map_err(|_| Self::poisoned())? = id;
        Ok(project)
    }

    async fn save(&self, project: &ProjectSnapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SpliceError::PersistenceUnavailable {
                reason: "save failure injected".to_string(),
            });
        }
        let id = self.active_id();
        self.projects
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(id, project.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
