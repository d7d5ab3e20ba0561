//! CLI Module
//!
//! Command-line interface for editing stored Splice projects.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::{AssetType, Resolution, TrackType};

/// Splice - timeline project editor
#[derive(Parser, Debug)]
#[command(name = "splice-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding stored projects (overrides the config)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Project id; defaults to the most recently saved project
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty project
    #[command(name = "new")]
    New {
        /// Display name
        name: String,

        #[arg(long, default_value = "1080p")]
        resolution: Resolution,

        #[arg(long, default_value_t = 30.0)]
        fps: f64,
    },

    /// Print the project
    #[command(name = "show")]
    Show {
        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Add an asset to the library
    #[command(name = "add-asset")]
    AddAsset {
        file_name: String,

        /// image, video or audio
        #[arg(short = 't', long = "type")]
        asset_type: AssetType,

        /// Length in seconds
        #[arg(long)]
        duration: Option<f64>,

        #[arg(long)]
        url: Option<String>,
    },

    /// Place an asset on the timeline
    #[command(name = "add-clip")]
    AddClip {
        asset_id: String,

        /// Start time in seconds
        #[arg(short, long, default_value_t = 0.0)]
        start: f64,

        /// video or audio
        #[arg(long, default_value = "video")]
        track: TrackType,

        #[arg(long, default_value_t = 0)]
        track_index: usize,
    },

    /// Cut a clip in two
    #[command(name = "split")]
    Split {
        clip_id: String,

        /// Cut point in seconds
        time: f64,
    },

    /// Remove a clip from the timeline
    #[command(name = "remove-clip")]
    RemoveClip { clip_id: String },

    /// Remove an asset from the library
    #[command(name = "remove-asset")]
    RemoveAsset { asset_id: String },
}
