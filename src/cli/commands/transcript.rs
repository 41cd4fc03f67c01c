//! Transcript command implementation.

use super::{options_with_languages, resolve_video_id};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::transcript::{format_fragments, FetchOutcome, OutputFormat, SidecarTextTracks};
use crate::windows::TranscriptWindow;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the transcript command.
#[allow(clippy::too_many_arguments)]
pub async fn run_transcript(
    input: &str,
    format: &str,
    windows: bool,
    lang: &[String],
    output: Option<String>,
    subtitles: &[String],
    settings: Settings,
) -> Result<()> {
    let video_id = resolve_video_id(input)?;
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut orchestrator = Orchestrator::new(settings)?;
    if !subtitles.is_empty() {
        let paths = subtitles.iter().map(PathBuf::from).collect();
        orchestrator = orchestrator.with_media(Arc::new(SidecarTextTracks::new(paths)));
    }

    let spinner = Output::spinner("Fetching transcript...");
    let (fetched, window_list) = orchestrator
        .transcript_windows(&video_id, &options_with_languages(lang))
        .await;
    spinner.finish_and_clear();

    if fetched.fragments.is_empty() {
        Output::error(&format!("No transcript available for {}", video_id));
        Output::info("Run 'ytmoments tracks' to see which caption tracks exist.");
        return Ok(());
    }

    let rendered = if windows {
        render_windows(&window_list, output_format)?
    } else {
        format_fragments(&video_id, &fetched.fragments, output_format)
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            let source = match &fetched.report.outcome {
                FetchOutcome::Network { .. } => "captions",
                FetchOutcome::MediaTextTracks { .. } => "media text tracks",
                FetchOutcome::Failed => "nothing",
            };
            Output::success(&format!(
                "Wrote {} fragments from {} to {}",
                fetched.fragments.len(),
                source,
                path
            ));
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn render_windows(windows: &[TranscriptWindow], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(windows)?,
        _ => windows
            .iter()
            .map(|w| format!("[{}] {}\n", w.format_timestamp(), w.text))
            .collect(),
    })
}
