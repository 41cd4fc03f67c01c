//! ytmoments CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ytmoments::cli::{commands, Cli, Commands};
use ytmoments::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ytmoments={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Analyze {
            video,
            mode,
            no_cache,
            json,
            window_size,
            lang,
            vss,
        } => {
            commands::run_analyze(video, mode.as_deref(), *no_cache, *json, *window_size, lang, vss, settings)
                .await?;
        }

        Commands::Transcript {
            video,
            format,
            windows,
            lang,
            output,
            subtitles,
        } => {
            commands::run_transcript(video, format, *windows, lang, output.clone(), subtitles, settings).await?;
        }

        Commands::Tracks { video, json } => {
            commands::run_tracks(video, *json, settings).await?;
        }

        Commands::Search { video, query, limit } => {
            commands::run_search(video, query, *limit, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Doctor => {
            let path = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
