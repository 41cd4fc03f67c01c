//! CLI command implementations.

mod analyze;
mod config;
mod doctor;
mod search;
mod serve;
mod tracks;
mod transcript;

pub use analyze::run_analyze;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::run_serve;
pub use tracks::run_tracks;
pub use transcript::run_transcript;

use crate::video::parse_video_id;

/// Video id from a URL or bare id, or a user-facing error.
fn resolve_video_id(input: &str) -> anyhow::Result<String> {
    parse_video_id(input).ok_or_else(|| anyhow::anyhow!("Not a YouTube URL or video ID: {}", input))
}

/// Fetch options for ad-hoc commands with optional language overrides.
fn options_with_languages(lang: &[String]) -> crate::orchestrator::AnalyzeOptions {
    crate::orchestrator::AnalyzeOptions {
        languages: (!lang.is_empty()).then(|| lang.to_vec()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_video_id() {
        assert_eq!(resolve_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert!(resolve_video_id("not a video").is_err());
    }

    #[test]
    fn test_language_overrides() {
        assert!(options_with_languages(&[]).languages.is_none());
        let options = options_with_languages(&["de".to_string()]);
        assert_eq!(options.languages, Some(vec!["de".to_string()]));
        assert!(options.use_cache);
    }
}
