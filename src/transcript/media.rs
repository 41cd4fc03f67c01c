//! Fallback: read cues from media text tracks.
//!
//! A media element exposes text tracks whose cue lists only populate once
//! the track is loading (hidden) or rendering (showing). Disabled tracks are
//! switched on temporarily and restored afterwards.

use super::parse::{parse_vtt, strip_markup};
use super::{sort_fragments, TranscriptFragment};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Loading state of a text track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Disabled,
    Hidden,
    Showing,
}

/// A timed cue as exposed by a text track.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One text track of a media element.
pub trait MediaTextTrack: Send + Sync {
    /// Track kind, e.g. `subtitles`, `captions` or `metadata`.
    fn kind(&self) -> String;
    fn mode(&self) -> TrackMode;
    fn set_mode(&self, mode: TrackMode);
    /// Cues loaded so far.
    fn cues(&self) -> Vec<Cue>;
}

/// The text tracks of the media currently playing.
#[async_trait]
pub trait MediaTextTracks: Send + Sync {
    async fn text_tracks(&self) -> Vec<Arc<dyn MediaTextTrack>>;
}

/// No media element; the fallback finds nothing.
pub struct NoMediaTracks;

#[async_trait]
impl MediaTextTracks for NoMediaTracks {
    async fn text_tracks(&self) -> Vec<Arc<dyn MediaTextTrack>> {
        Vec::new()
    }
}

async fn wait_for_cues(track: &dyn MediaTextTrack, timeout: Duration) -> bool {
    if !track.cues().is_empty() {
        return true;
    }
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
        if !track.cues().is_empty() {
            return true;
        }
    }
    false
}

/// Collect fragments from subtitle and caption tracks.
///
/// A disabled track is switched to hidden and polled for up to `wait`; if it
/// stays empty it is switched to showing for up to `retry_wait`. Each track's
/// original mode is restored afterwards.
pub async fn read_media_fragments(
    source: &dyn MediaTextTracks,
    wait: Duration,
    retry_wait: Duration,
) -> Vec<TranscriptFragment> {
    let tracks: Vec<_> = source
        .text_tracks()
        .await
        .into_iter()
        .filter(|t| {
            let kind = t.kind().to_lowercase();
            kind == "subtitles" || kind == "captions"
        })
        .collect();

    let mut fragments = Vec::new();
    for track in tracks {
        let previous = track.mode();
        let forced = previous == TrackMode::Disabled;
        if forced {
            track.set_mode(TrackMode::Hidden);
        }

        let mut has_cues = wait_for_cues(track.as_ref(), wait).await;
        if !has_cues && forced {
            track.set_mode(TrackMode::Showing);
            has_cues = wait_for_cues(track.as_ref(), retry_wait).await;
        }
        debug!("Media track {} has cues: {}", track.kind(), has_cues);

        for cue in track.cues() {
            let text = strip_markup(&cue.text);
            if !text.is_empty() {
                fragments.push(TranscriptFragment::new(cue.start, cue.end.max(cue.start), text));
            }
        }

        track.set_mode(previous);
    }

    sort_fragments(&mut fragments);
    fragments
}

/// A text track backed by a local WebVTT file.
///
/// Cues are only visible while the track is not disabled, like a lazily
/// loaded track on a media element.
pub struct SidecarTrack {
    kind: String,
    mode: Mutex<TrackMode>,
    cues: Vec<Cue>,
}

impl SidecarTrack {
    pub fn new(kind: impl Into<String>, cues: Vec<Cue>) -> Self {
        Self {
            kind: kind.into(),
            mode: Mutex::new(TrackMode::Disabled),
            cues,
        }
    }

    /// Load cues from a WebVTT file.
    pub fn from_vtt_file(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)?;
        let cues = parse_vtt(&body)
            .into_iter()
            .map(|f| Cue {
                start: f.start,
                end: f.end,
                text: f.text,
            })
            .collect();
        Ok(Self::new("subtitles", cues))
    }
}

impl MediaTextTrack for SidecarTrack {
    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn mode(&self) -> TrackMode {
        self.mode.lock().map(|m| *m).unwrap_or(TrackMode::Disabled)
    }

    fn set_mode(&self, mode: TrackMode) {
        if let Ok(mut current) = self.mode.lock() {
            *current = mode;
        }
    }

    fn cues(&self) -> Vec<Cue> {
        if self.mode() == TrackMode::Disabled {
            Vec::new()
        } else {
            self.cues.clone()
        }
    }
}

/// Media text tracks read from sidecar subtitle files.
pub struct SidecarTextTracks {
    paths: Vec<PathBuf>,
}

impl SidecarTextTracks {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl MediaTextTracks for SidecarTextTracks {
    async fn text_tracks(&self) -> Vec<Arc<dyn MediaTextTrack>> {
        let mut tracks: Vec<Arc<dyn MediaTextTrack>> = Vec::new();
        for path in &self.paths {
            match SidecarTrack::from_vtt_file(path) {
                Ok(track) => tracks.push(Arc::new(track)),
                Err(e) => debug!("Skipping sidecar {}: {}", path.display(), e),
            }
        }
        tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Track whose cues only appear while it is rendering.
    struct ShowingOnlyTrack {
        mode: Mutex<TrackMode>,
    }

    impl MediaTextTrack for ShowingOnlyTrack {
        fn kind(&self) -> String {
            "captions".to_string()
        }
        fn mode(&self) -> TrackMode {
            *self.mode.lock().unwrap()
        }
        fn set_mode(&self, mode: TrackMode) {
            *self.mode.lock().unwrap() = mode;
        }
        fn cues(&self) -> Vec<Cue> {
            if self.mode() == TrackMode::Showing {
                vec![Cue { start: 1.0, end: 2.0, text: "<i>shown</i>".to_string() }]
            } else {
                Vec::new()
            }
        }
    }

    struct Fixed(Vec<Arc<dyn MediaTextTrack>>);

    #[async_trait]
    impl MediaTextTracks for Fixed {
        async fn text_tracks(&self) -> Vec<Arc<dyn MediaTextTrack>> {
            self.0.clone()
        }
    }

    fn cue(start: f64, text: &str) -> Cue {
        Cue { start, end: start + 1.0, text: text.to_string() }
    }

    #[tokio::test]
    async fn test_disabled_track_is_loaded_and_restored() {
        let track = Arc::new(SidecarTrack::new(
            "subtitles",
            vec![cue(5.0, "later"), cue(1.0, "<b>first</b>  line")],
        ));
        let source = Fixed(vec![track.clone()]);

        let fragments =
            read_media_fragments(&source, Duration::from_millis(50), Duration::from_millis(50)).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "first line");
        assert_eq!(fragments[1].start, 5.0);
        assert_eq!(track.mode(), TrackMode::Disabled);
    }

    #[tokio::test]
    async fn test_secondary_attempt_in_showing_mode() {
        let track = Arc::new(ShowingOnlyTrack { mode: Mutex::new(TrackMode::Disabled) });
        let source = Fixed(vec![track.clone()]);

        let fragments =
            read_media_fragments(&source, Duration::from_millis(30), Duration::from_millis(30)).await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "shown");
        assert_eq!(track.mode(), TrackMode::Disabled);
    }

    #[tokio::test]
    async fn test_non_caption_tracks_are_ignored() {
        let track = Arc::new(SidecarTrack::new("metadata", vec![cue(0.0, "chapter")]));
        let source = Fixed(vec![track]);
        let fragments =
            read_media_fragments(&source, Duration::from_millis(10), Duration::from_millis(10)).await;
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn test_sidecar_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.vtt");
        std::fs::write(&path, "WEBVTT\n\n00:00:02.000 --> 00:00:04.000\nfrom file\n").unwrap();

        let source = SidecarTextTracks::new(vec![path, dir.path().join("missing.vtt")]);
        let fragments =
            read_media_fragments(&source, Duration::from_millis(10), Duration::from_millis(10)).await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "from file");
    }
}
