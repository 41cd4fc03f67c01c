//! Tracks command implementation.

use super::resolve_video_id;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the tracks command.
pub async fn run_tracks(input: &str, json: bool, settings: Settings) -> Result<()> {
    let video_id = resolve_video_id(input)?;
    let ui_language = settings.transcript.ui_language.clone();
    let orchestrator = Orchestrator::new(settings)?;

    let diagnostics = orchestrator.fetcher().diagnostics(&video_id, &ui_language).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        return Ok(());
    }

    if diagnostics.is_empty() {
        Output::warning(&format!("No caption tracks found for {}", video_id));
        return Ok(());
    }

    Output::header("Player tracks");
    for track in &diagnostics.player {
        Output::track(track);
    }
    Output::header("Listed tracks");
    for track in &diagnostics.list {
        Output::track(track);
    }

    Ok(())
}
