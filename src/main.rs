//! Splice CLI - Timeline Project Editor
//!
//! Command-line interface for editing stored Splice projects.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use splice::cli::{commands, Cli, Commands};
use splice::SpliceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Splice v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => SpliceConfig::from_file(path)?,
        None => SpliceConfig::default(),
    };
    if let Some(dir) = cli.dir {
        config.storage_dir = dir;
    }
    if let Some(project) = cli.project {
        config.project_id = Some(project);
    }

    match cli.command {
        Some(cmd) => handle_command(&config, cmd).await,
        None => {
            println!("Splice v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(config: &SpliceConfig, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::New {
            name,
            resolution,
            fps,
        } => commands::new_project(config, &name, resolution, fps).await,
        Commands::Show { json } => commands::show(config, json).await,
        Commands::AddAsset {
            file_name,
            asset_type,
            duration,
            url,
        } => commands::add_asset(config, &file_name, asset_type, duration, url.as_deref()).await,
        Commands::AddClip {
            asset_id,
            start,
            track,
            track_index,
        } => commands::add_clip(config, &asset_id, start, track, track_index).await,
        Commands::Split { clip_id, time } => commands::split(config, &clip_id, time).await,
        Commands::RemoveClip { clip_id } => commands::remove_clip(config, &clip_id).await,
        Commands::RemoveAsset { asset_id } => commands::remove_asset(config, &asset_id).await,
    }
}
