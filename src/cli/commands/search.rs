//! Search command implementation.

use super::{options_with_languages, resolve_video_id};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(input: &str, query: &str, limit: usize, settings: Settings) -> Result<()> {
    let video_id = resolve_video_id(input)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator
        .search_transcript(&video_id, query, limit, &options_with_languages(&[]))
        .await;
    spinner.finish_and_clear();

    if results.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!("Found {} results", results.len()));
    for (hit, window) in &results {
        Output::search_result(
            &window.format_timestamp(),
            hit.score,
            &window.text,
            &orchestrator.seek_url(&video_id, window.start),
        );
    }

    Ok(())
}
