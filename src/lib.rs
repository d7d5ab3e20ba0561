//! Splice - Timeline Project Store
//!
//! Splice holds the state of a timeline media editor: an asset library,
//! clips on video and audio tracks, a selection and playback view state.
//!
//! # Architecture
//!
//! Project state is split in two:
//! - The tracked document (settings, assets, timeline) is what undo/redo
//!   walks through and what autosave writes.
//! - The view state (selection, playhead, play flag, zoom) is saved with
//!   the project but never enters history.
//!
//! [`ProjectStore`] owns both halves and exposes every mutation command.
//! A [`Session`] connects a store to a [`PersistenceGateway`] and debounces
//! writes.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod state;

pub use config::SpliceConfig;
pub use error::{Result, SpliceError};
pub use model::{
    Asset, AssetType, Clip, ClipPatch, ProjectDocument, ProjectSnapshot, Selection, Timeline,
    TrackType, ViewState,
};
pub use state::{
    ChangeKind, FileGateway, HistoryManager, MemoryGateway, PersistenceGateway, ProjectStore,
    Session,
};
