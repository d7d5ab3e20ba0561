//! Error handling for Splice
//!
//! Mutation commands never fail: unknown ids and out-of-range arguments are
//! no-ops. The errors here come from the collaborators around the store
//! (persistence, configuration, the autosave task).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Splice operations
pub type Result<T> = std::result::Result<T, SpliceError>;

/// Main error type for Splice operations
#[derive(Error, Debug)]
pub enum SpliceError {
    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported project schema version: {version}")]
    UnsupportedSchemaVersion { version: u32 },

    // Project Errors
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Invalid project id: {id}")]
    InvalidProjectId { id: String },

    // Persistence Errors
    #[error("Persistence is not supported: {reason}")]
    PersistenceUnavailable { reason: String },

    #[error("Autosave task is no longer running")]
    AutosaveClosed,

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SpliceError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SpliceError::FileReadError { .. } => "FILE_READ_ERROR",
            SpliceError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            SpliceError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            SpliceError::Serialization(_) => "SERIALIZATION_ERROR",
            SpliceError::UnsupportedSchemaVersion { .. } => "UNSUPPORTED_SCHEMA_VERSION",
            SpliceError::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            SpliceError::InvalidProjectId { .. } => "INVALID_PROJECT_ID",
            SpliceError::PersistenceUnavailable { .. } => "PERSISTENCE_UNAVAILABLE",
            SpliceError::AutosaveClosed => "AUTOSAVE_CLOSED",
            SpliceError::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    /// Returns true if this error indicates the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SpliceError::FileWriteError { .. } | SpliceError::DirectoryCreateError { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SpliceError::FileReadError { .. } => Some("Check the file path and permissions."),
            SpliceError::FileWriteError { .. } | SpliceError::DirectoryCreateError { .. } => {
                Some("Check free disk space and write permissions, then save again.")
            }
            SpliceError::UnsupportedSchemaVersion { .. } => {
                Some("The project was saved by a newer version of Splice.")
            }
            SpliceError::ProjectNotFound { .. } => Some("Create the project with 'splice-cli new'."),
            SpliceError::InvalidConfig { .. } => Some("Fix the configuration file and retry."),
            _ => None,
        }
    }
}
