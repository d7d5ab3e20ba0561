//! File-backed project storage.
//!
//! Each project lives in `<storage_dir>/<project-id>.json`, wrapped in a
//! [`StoredProject`] envelope carrying a schema version and save time.
//! Writes go to a temporary file first and are renamed into place. A save
//! whose serialized body hashes the same as the previous write is skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, SpliceError};
use crate::model::ProjectSnapshot;
use crate::state::gateway::{PersistenceGateway, DEFAULT_PROJECT_ID};

/// Current on-disk schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Extension for stored project files.
const PROJECT_EXTENSION: &str = "json";

/// On-disk envelope around a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub project: ProjectSnapshot,
}

/// Gateway storing projects as JSON files in one directory.
#[derive(Debug)]
pub struct FileGateway {
    storage_dir: PathBuf,
    /// Project that `save` writes to; follows the last `load`.
    active_id: Mutex<String>,
    /// Digest of the last body written, per active project.
    last_digest: Mutex<Option<(String, String)>>,
}

impl FileGateway {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            active_id: Mutex::new(DEFAULT_PROJECT_ID.to_string()),
            last_digest: Mutex::new(None),
        }
    }

    /// A gateway whose saves go to `project_id` until a load says otherwise.
    pub fn with_project(storage_dir: impl Into<PathBuf>, project_id: &str) -> Result<Self> {
        validate_project_id(project_id)?;
        let gateway = Self::new(storage_dir);
        gateway.set_active_id(project_id)?;
        Ok(gateway)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn project_path(&self, project_id: &str) -> PathBuf {
        self.storage_dir
            .join(format!("{project_id}.{PROJECT_EXTENSION}"))
    }

    pub fn active_id(&self) -> Result<String> {
        self.active_id
            .lock()
            .map(|id| id.clone())
            .map_err(|_| lock_poisoned())
    }

    fn set_active_id(&self, project_id: &str) -> Result<()> {
        *self.active_id.lock().map_err(|_| lock_poisoned())? = project_id.to_string();
        Ok(())
    }

    /// Project ids in the storage directory, most recently saved first.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        list_projects(&self.storage_dir)
    }

    async fn read_project(&self, project_id: &str) -> Result<Option<ProjectSnapshot>> {
        let path = self.project_path(project_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SpliceError::FileReadError { path, source: e }),
        };

        let stored: StoredProject = serde_json::from_str(&content)?;
        if stored.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(SpliceError::UnsupportedSchemaVersion {
                version: stored.schema_version,
            });
        }

        info!(
            project = project_id,
            saved_at = %stored.saved_at,
            "Loaded project"
        );
        Ok(Some(stored.project))
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    fn is_supported(&self) -> bool {
        fs::create_dir_all(&self.storage_dir).is_ok()
    }

    async fn load(&self, project_id: Option<&str>) -> Result<Option<ProjectSnapshot>> {
        let id = match project_id {
            Some(id) => {
                validate_project_id(id)?;
                id.to_string()
            }
            None => match self.list_projects()?.into_iter().next() {
                Some(latest) => latest,
                None => return Ok(None),
            },
        };
        self.set_active_id(&id)?;
        self.read_project(&id).await
    }

    async fn save(&self, project: &ProjectSnapshot) -> Result<()> {
        let id = self.active_id()?;
        let body = serde_json::to_string(project)?;
        let digest = hex_digest(body.as_bytes());

        {
            let last = self.last_digest.lock().map_err(|_| lock_poisoned())?;
            if last.as_ref() == Some(&(id.clone(), digest.clone())) {
                debug!(project = %id, "Project unchanged since last write, skipping");
                return Ok(());
            }
        }

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .map_err(|e| SpliceError::DirectoryCreateError {
                path: self.storage_dir.clone(),
                source: e,
            })?;

        let stored = StoredProject {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            project: project.clone(),
        };
        let content = serde_json::to_string_pretty(&stored)?;

        let path = self.project_path(&id);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| SpliceError::FileWriteError {
                path: tmp_path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| SpliceError::FileWriteError {
                path: path.clone(),
                source: e,
            })?;

        *self.last_digest.lock().map_err(|_| lock_poisoned())? = Some((id.clone(), digest));
        info!(project = %id, path = %path.display(), "Saved project");
        Ok(())
    }
}

/// List stored project ids in `storage_dir`, most recently modified first.
pub fn list_projects(storage_dir: &Path) -> Result<Vec<String>> {
    if !storage_dir.exists() {
        return Ok(Vec::new());
    }

    let mut projects: Vec<(String, std::time::SystemTime)> = WalkDir::new(storage_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|e| e.to_str()) == Some(PROJECT_EXTENSION)
        })
        .filter_map(|entry| {
            let id = entry.path().file_stem()?.to_str()?.to_string();
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((id, modified))
        })
        .collect();

    // Newest first; ties broken by id for a stable order
    projects.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(projects.into_iter().map(|(id, _)| id).collect())
}

/// Ids become file names, so keep them to a safe character set.
fn validate_project_id(project_id: &str) -> Result<()> {
    let valid = !project_id.is_empty()
        && project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SpliceError::InvalidProjectId {
            id: project_id.to_string(),
        })
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn lock_poisoned() -> SpliceError {
    SpliceError::PersistenceUnavailable {
        reason: "file gateway lock poisoned".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn named(name: &str) -> ProjectSnapshot {
        let mut project = ProjectSnapshot::default();
        project.document.project_settings.name = name.to_string();
        project
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::with_project(dir.path(), "promo").unwrap();
        assert!(gateway.is_supported());

        gateway.save(&named("Promo cut")).await.unwrap();
        assert!(dir.path().join("promo.json").exists());
        assert!(!dir.path().join("promo.json.tmp").exists());

        let reopened = FileGateway::new(dir.path());
        let loaded = reopened.load(Some("promo")).await.unwrap().unwrap();
        assert_eq!(loaded, named("Promo cut"));
    }

    #[tokio::test]
    async fn test_load_missing_project() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::new(dir.path());
        assert!(gateway.load(Some("nothing")).await.unwrap().is_none());
        assert!(gateway.load(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_latest_when_unnamed() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::with_project(dir.path(), "only").unwrap();
        gateway.save(&named("Only")).await.unwrap();

        let reopened = FileGateway::new(dir.path());
        let loaded = reopened.load(None).await.unwrap().unwrap();
        assert_eq!(loaded.document.project_settings.name, "Only");
        assert_eq!(reopened.active_id().unwrap(), "only");
    }

    #[tokio::test]
    async fn test_newer_schema_rejected() {
        let dir = tempdir().unwrap();
        let stored = StoredProject {
            schema_version: CURRENT_SCHEMA_VERSION + 1,
            saved_at: Utc::now(),
            project: ProjectSnapshot::default(),
        };
        fs::write(
            dir.path().join("future.json"),
            serde_json::to_string(&stored).unwrap(),
        )
        .unwrap();

        let gateway = FileGateway::new(dir.path());
        let err = gateway.load(Some("future")).await.unwrap_err();
        assert!(matches!(
            err,
            SpliceError::UnsupportedSchemaVersion { version } if version == CURRENT_SCHEMA_VERSION + 1
        ));
    }

    #[tokio::test]
    async fn test_identical_save_is_skipped() {
        let dir = tempdir().unwrap();
        let gateway = FileGateway::with_project(dir.path(), "same").unwrap();
        let path = gateway.project_path("same");

        gateway.save(&named("Same")).await.unwrap();
        let first = fs::read_to_string(&path).unwrap();
        gateway.save(&named("Same")).await.unwrap();
        let second = fs::read_to_string(&path).unwrap();

        // saved_at would differ if the file had been rewritten
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_project_ids() {
        assert!(FileGateway::with_project("/tmp", "../escape").is_err());
        assert!(FileGateway::with_project("/tmp", "").is_err());
        assert!(FileGateway::with_project("/tmp", "ok_id-2").is_ok());
    }

    #[test]
    fn test_list_projects_ignores_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let ids = list_projects(dir.path()).unwrap();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_list_projects_nonexistent_dir() {
        let ids = list_projects(Path::new("/nonexistent/splice/projects")).unwrap();
        assert!(ids.is_empty());
    }
}
