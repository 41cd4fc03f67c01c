//! Video identifiers and watch URLs.

use regex::Regex;
use std::sync::LazyLock;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            (?:https?://)?
            (?:[a-zA-Z0-9-]+\.)*
            (?:youtube\.com/(?:watch\?(?:[^&\s]*&)*v=|embed/|v/|shorts/|live/)|youtu\.be/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

/// Extract the 11-character video id from a watch URL, short link or bare id.
pub fn parse_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID.captures(input.trim())?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Watch URL that starts playback at `seconds`.
pub fn seek_url(video_id: &str, seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0).floor() as u64 } else { 0 };
    format!("https://www.youtube.com/watch?v={}&t={}s", video_id, seconds)
}
