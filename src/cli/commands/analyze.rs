//! Analyze command implementation.

use super::resolve_video_id;
use crate::cli::Output;
use crate::config::{AnalysisMode, Settings};
use crate::orchestrator::{AnalyzeOptions, Orchestrator, StatusEvent};
use anyhow::Result;

/// Run the analyze command.
#[allow(clippy::too_many_arguments)]
pub async fn run_analyze(
    input: &str,
    mode: Option<&str>,
    no_cache: bool,
    json: bool,
    window_size: Option<f64>,
    lang: &[String],
    vss: &[String],
    settings: Settings,
) -> Result<()> {
    let video_id = resolve_video_id(input)?;
    let mode = mode
        .map(|m| m.parse::<AnalysisMode>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    if let Some(size) = window_size {
        if !(size > 0.0) {
            anyhow::bail!("Window size must be positive, got {}", size);
        }
    }

    let orchestrator = Orchestrator::new(settings)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<StatusEvent>();
    let options = AnalyzeOptions {
        mode,
        use_cache: !no_cache,
        window_size_seconds: window_size,
        languages: (!lang.is_empty()).then(|| lang.to_vec()),
        forced_vss_ids: vss.to_vec(),
        events: Some(tx),
    };

    let spinner = (!json).then(|| Output::spinner(&format!("Analyzing {}...", video_id)));
    let progress = spinner.clone();
    let relay = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(pb) = &progress {
                pb.set_message(event.describe());
            }
        }
    });

    let result = orchestrator.analyze(&video_id, options).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let _ = relay.await;

    let Some(analysis) = result? else {
        Output::warning("Another analysis is already running.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    match &analysis.status {
        StatusEvent::Done { .. } => {
            Output::success(&analysis.status.describe());
            for (i, moment) in analysis.moments.iter().enumerate() {
                Output::moment(i + 1, moment, &orchestrator.seek_url(&video_id, moment.start));
            }
        }
        StatusEvent::NoTranscript { tracks } => {
            Output::warning(&analysis.status.describe());
            if tracks.is_empty() {
                Output::info("No caption tracks were discovered.");
            } else {
                Output::info("Discovered tracks (try --lang or --vss):");
                for track in tracks.player.iter().chain(tracks.list.iter()) {
                    Output::track(track);
                }
            }
        }
        StatusEvent::NoApiKey => {
            Output::warning(&analysis.status.describe());
            Output::info("Set youtube.api_key in the config or export YOUTUBE_API_KEY.");
        }
        other => Output::warning(&other.describe()),
    }

    Ok(())
}
