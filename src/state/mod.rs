//! State Management Module
//!
//! The project store with its undo history, and the persistence side:
//! gateways, debounced autosave and the session tying them to a store.

pub mod autosave;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod store;
pub mod undo;

pub use autosave::{AutosaveHandle, Autosaver};
pub use gateway::{MemoryGateway, PersistenceGateway, DEFAULT_PROJECT_ID};
pub use session::{LoadOutcome, Session};
pub use storage::{list_projects, FileGateway, StoredProject, CURRENT_SCHEMA_VERSION};
pub use store::{ChangeKind, ProjectStore, StoreEvent, SubscriptionId};
pub use undo::{HistoryEntry, HistoryManager};
