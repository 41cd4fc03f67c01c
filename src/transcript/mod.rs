//! Transcript acquisition.
//!
//! Discovers caption tracks from several sources, tries a ranked list of
//! caption URLs in three transport formats, and falls back to reading cues
//! from media text tracks. Total failure yields an empty transcript and a
//! diagnostic report, never an error.

mod candidates;
mod fetcher;
mod format;
mod media;
mod parse;
mod tracks;
mod transport;

pub use candidates::{base_language, build_candidates, Candidate, Selector, TransportFormat};
pub use fetcher::{
    first_success, CandidateAttempt, FetchOptions, FetchOutcome, FetchReport, FetchedTranscript, TranscriptFetcher,
};
pub use format::{format_fragments, OutputFormat, TranscriptExport};
pub use media::{
    read_media_fragments, Cue, MediaTextTrack, MediaTextTracks, NoMediaTracks, SidecarTextTracks,
    SidecarTrack, TrackMode,
};
pub use parse::{parse_json3, parse_response, parse_vtt, parse_xml, strip_markup};
pub use tracks::{
    merge_tracks, parse_player_tracks, parse_track_list, select_track, track_score,
    NoObserver, StaticTracks, TrackDiagnostics, TrackObserver, TrackSummary, WatchPageObserver,
};
pub use transport::{CaptionTransport, HttpTransport};

use serde::{Deserialize, Serialize};

/// Caption track metadata as published by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// BCP-47 style language code, e.g. `en` or `en-US`.
    pub language_code: String,
    /// Empty for human-authored tracks, `asr` for auto-generated ones.
    pub kind: String,
    /// Display name of the track.
    pub name: String,
    /// Platform track identifier, e.g. `.en` or `a.en`.
    pub vss_id: String,
    /// Direct caption URL, when known.
    pub base_url: String,
    /// Whether the platform flags this track as the default.
    pub is_default: bool,
}

impl CaptionTrack {
    /// Key used to deduplicate tracks seen through different sources.
    ///
    /// The base URL when present, otherwise the vss id, otherwise the
    /// `(language, kind, name)` triple.
    pub fn identity_key(&self) -> String {
        if !self.base_url.is_empty() {
            self.base_url.clone()
        } else if !self.vss_id.is_empty() {
            self.vss_id.clone()
        } else {
            format!("{}|{}|{}", self.language_code, self.kind, self.name)
        }
    }

    /// Whether this track was generated by speech recognition.
    pub fn is_auto_generated(&self) -> bool {
        self.kind == "asr"
    }
}

/// A single timed piece of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds, never before `start`.
    pub end: f64,
    /// Caption text, never empty.
    pub text: String,
}

impl TranscriptFragment {
    /// Create a new fragment.
    pub fn new(start: f64, end: f64, text: String) -> Self {
        Self { start, end, text }
    }
}

/// Sort fragments by start time, keeping the order of equal starts.
pub fn sort_fragments(fragments: &mut [TranscriptFragment]) {
    fragments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_precedence() {
        let mut track = CaptionTrack {
            language_code: "en".to_string(),
            kind: "asr".to_string(),
            name: "English".to_string(),
            vss_id: "a.en".to_string(),
            base_url: "https://example.com/tt?lang=en".to_string(),
            is_default: false,
        };
        assert_eq!(track.identity_key(), "https://example.com/tt?lang=en");

        track.base_url.clear();
        assert_eq!(track.identity_key(), "a.en");

        track.vss_id.clear();
        assert_eq!(track.identity_key(), "en|asr|English");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }

    #[test]
    fn test_sort_fragments_is_stable() {
        let mut fragments = vec![
            TranscriptFragment::new(5.0, 6.0, "b".to_string()),
            TranscriptFragment::new(1.0, 2.0, "a".to_string()),
            TranscriptFragment::new(5.0, 7.0, "c".to_string()),
        ];
        sort_fragments(&mut fragments);
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }
}
