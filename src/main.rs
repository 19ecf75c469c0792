use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use travelmap::image_processing::OutputOptions;
use travelmap::server::{start_server, AppState};
use travelmap::settings::Settings;
use travelmap::trip::MapData;
use travelmap::{etl, processing};

#[derive(Parser)]
#[command(author, version, about = "Travel map data and media tooling")]
struct Args {
    /// Settings file (defaults to ./travelmap.ini or the app data directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn the trip config into map data (markers, routes, bounds)
    Etl {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert and resize traveler photos for the web
    ProcessImages {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve map data, popups and assets over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("travelmap=info")),
        )
        .init();

    let args = Args::parse();
    let settings = match args.settings {
        Some(ref path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match args.command {
        Command::Etl { config, output } => {
            let config = config.unwrap_or_else(|| settings.trip_config.clone());
            let output = output.unwrap_or_else(|| settings.map_data.clone());
            etl::run(&settings, &config, &output).await?;
        }
        Command::ProcessImages { input, output } => {
            let input = input.unwrap_or_else(|| settings.media_dir.clone());
            let output = output.unwrap_or_else(|| settings.assets_dir.clone());
            let options = OutputOptions {
                max_width: settings.image_max_width,
                quality: settings.jpeg_quality,
            };
            let stats = tokio::task::spawn_blocking(move || {
                processing::process_media_directory(&input, &output, options)
            })
            .await
            .context("Image processing task panicked")??;
            if stats.failed > 0 {
                warn!("⚠️  {} file(s) failed to convert", stats.failed);
            }
        }
        Command::Serve { port } => {
            let mut settings = settings;
            if let Some(port) = port {
                settings.port = port;
            }
            let map_data = if settings.map_data.exists() {
                MapData::load(&settings.map_data)?
            } else {
                warn!(
                    "⚠️  {} not found, serving empty map data. Run `travelmap etl` first.",
                    settings.map_data.display()
                );
                MapData::default()
            };
            info!("🗺️  Loaded {} region(s)", map_data.regions.len());
            start_server(AppState::new(settings, map_data)).await?;
        }
    }

    Ok(())
}
