//! Transcript fetcher: discovery, selection, retrieval, fallback and retry.

use super::candidates::build_candidates;
use super::media::{read_media_fragments, MediaTextTracks, NoMediaTracks};
use super::parse::parse_response;
use super::tracks::{list_tracks, merge_tracks, select_track, NoObserver, TrackDiagnostics, TrackObserver};
use super::transport::CaptionTransport;
use super::{sort_fragments, CaptionTrack, TranscriptFragment};
use crate::config::TranscriptSettings;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per-call fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    /// Interface language for the track listing request.
    pub ui_language: String,
    /// Track ids tried after every other candidate.
    pub forced_vss_ids: Vec<String>,
    /// Number of full attempts; at least one is always made.
    pub retries: u32,
    pub retry_delay: Duration,
    pub cue_wait: Duration,
    pub cue_retry_wait: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&TranscriptSettings::default())
    }
}

impl From<&TranscriptSettings> for FetchOptions {
    fn from(settings: &TranscriptSettings) -> Self {
        Self {
            languages: dedupe_languages(&settings.languages),
            ui_language: settings.ui_language.clone(),
            forced_vss_ids: Vec::new(),
            retries: settings.fetch_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            cue_wait: Duration::from_millis(settings.cue_wait_ms),
            cue_retry_wait: Duration::from_millis(settings.cue_retry_wait_ms),
        }
    }
}

/// Drop blank and case-insensitive duplicate language tags, keeping order.
fn dedupe_languages(languages: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    languages
        .iter()
        .filter(|l| !l.trim().is_empty() && seen.insert(l.to_lowercase()))
        .cloned()
        .collect()
}

/// One attempted caption URL.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateAttempt {
    pub url: String,
    /// Whether the request itself succeeded with an OK status.
    pub ok: bool,
    /// Response body length.
    pub len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Where the transcript came from, if anywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FetchOutcome {
    Network { url: String },
    MediaTextTracks { count: usize },
    Failed,
}

/// Advisory record of a fetch; not part of any behavioral contract.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub chosen: Option<CaptionTrack>,
    pub tried: Vec<CandidateAttempt>,
    pub tracks: TrackDiagnostics,
    pub attempts: u32,
    pub outcome: FetchOutcome,
}

impl Default for FetchReport {
    fn default() -> Self {
        Self {
            chosen: None,
            tried: Vec::new(),
            tracks: TrackDiagnostics::default(),
            attempts: 0,
            outcome: FetchOutcome::Failed,
        }
    }
}

/// Fragments plus how they were obtained.
#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    pub fragments: Vec<TranscriptFragment>,
    pub report: FetchReport,
}

/// Try `items` strictly in order; the first one whose attempt yields a value wins.
///
/// Every attempt, successful or not, is appended to `log`.
pub async fn first_success<I, U, F, Fut>(
    items: I,
    mut attempt: F,
    log: &mut Vec<CandidateAttempt>,
) -> Option<(I::Item, U)>
where
    I: IntoIterator,
    I::Item: Clone,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = (CandidateAttempt, Option<U>)>,
{
    for item in items {
        let (record, value) = attempt(item.clone()).await;
        log.push(record);
        if let Some(value) = value {
            return Some((item, value));
        }
    }
    None
}

/// Fetches transcripts for a video.
pub struct TranscriptFetcher {
    transport: Arc<dyn CaptionTransport>,
    observer: Arc<dyn TrackObserver>,
    media: Arc<dyn MediaTextTracks>,
}

impl TranscriptFetcher {
    /// Fetcher using only the explicit track listing and URL guesses.
    pub fn new(transport: Arc<dyn CaptionTransport>) -> Self {
        Self {
            transport,
            observer: Arc::new(NoObserver),
            media: Arc::new(NoMediaTracks),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TrackObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_media(mut self, media: Arc<dyn MediaTextTracks>) -> Self {
        self.media = media;
        self
    }

    /// Fetch a transcript. Total failure yields no fragments, never an error.
    #[instrument(skip(self, options))]
    pub async fn fetch(&self, video_id: &str, options: &FetchOptions) -> FetchedTranscript {
        let attempts = options.retries.max(1);
        let mut report = FetchReport::default();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(options.retry_delay).await;
            }
            report.attempts = attempt + 1;

            if let Some(fragments) = self.attempt(video_id, options, &mut report).await {
                info!(
                    "Fetched {} fragments for {} on attempt {}",
                    fragments.len(),
                    video_id,
                    attempt + 1
                );
                return FetchedTranscript { fragments, report };
            }
            debug!("Attempt {} for {} produced no fragments", attempt + 1, video_id);
        }

        warn!("No transcript obtainable for {}", video_id);
        report.outcome = FetchOutcome::Failed;
        FetchedTranscript {
            fragments: Vec::new(),
            report,
        }
    }

    async fn attempt(
        &self,
        video_id: &str,
        options: &FetchOptions,
        report: &mut FetchReport,
    ) -> Option<Vec<TranscriptFragment>> {
        let player = self.observer.observed_tracks(video_id).await;
        let listed = self.list_tracks(video_id, &options.ui_language).await;
        report.tracks = TrackDiagnostics::new(&player, &listed);

        let tracks = merge_tracks(&[player, listed]);
        let chosen = select_track(&tracks, &options.languages).cloned();
        debug!("Discovered {} tracks, chosen: {:?}", tracks.len(), chosen);
        report.chosen = chosen.clone();

        let candidates = build_candidates(
            video_id,
            chosen.as_ref(),
            &tracks,
            &options.languages,
            &options.forced_vss_ids,
        );

        let transport = self.transport.as_ref();
        let found = first_success(
            candidates,
            |candidate| async move { try_candidate(transport, &candidate.url).await },
            &mut report.tried,
        )
        .await;
        if let Some((candidate, mut fragments)) = found {
            sort_fragments(&mut fragments);
            report.outcome = FetchOutcome::Network { url: candidate.url };
            return Some(fragments);
        }

        let fragments = read_media_fragments(self.media.as_ref(), options.cue_wait, options.cue_retry_wait).await;
        if fragments.is_empty() {
            None
        } else {
            report.outcome = FetchOutcome::MediaTextTracks {
                count: fragments.len(),
            };
            Some(fragments)
        }
    }

    /// Tracks from the platform's listing endpoint; failures are empty.
    pub async fn list_tracks(&self, video_id: &str, ui_language: &str) -> Vec<CaptionTrack> {
        match list_tracks(self.transport.as_ref(), video_id, ui_language).await {
            Ok(tracks) => tracks,
            Err(e) => {
                debug!("Track listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Tracks seen by the observer and by the listing endpoint.
    pub async fn diagnostics(&self, video_id: &str, ui_language: &str) -> TrackDiagnostics {
        let player = self.observer.observed_tracks(video_id).await;
        let listed = self.list_tracks(video_id, ui_language).await;
        TrackDiagnostics::new(&player, &listed)
    }
}

async fn try_candidate(
    transport: &dyn CaptionTransport,
    url: &str,
) -> (CandidateAttempt, Option<Vec<TranscriptFragment>>) {
    let mut record = CandidateAttempt {
        url: url.to_string(),
        ok: false,
        len: 0,
        error: None,
    };
    match transport.get_text(url).await {
        Ok(Some(body)) => {
            record.ok = true;
            record.len = body.len();
            if body.trim().is_empty() {
                return (record, None);
            }
            let fragments = parse_response(&body);
            (record, (!fragments.is_empty()).then_some(fragments))
        }
        Ok(None) => (record, None),
        Err(e) => {
            record.error = Some(e.to_string());
            (record, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MomentsError, Result};
    use crate::transcript::media::{Cue, MediaTextTrack, SidecarTrack};
    use crate::transcript::tracks::StaticTracks;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by exact URL and records every request.
    #[derive(Default)]
    struct FakeTransport {
        bodies: HashMap<String, String>,
        fail: Vec<String>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CaptionTransport for FakeTransport {
        async fn get_text(&self, url: &str) -> Result<Option<String>> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.fail.iter().any(|f| f == url) {
                return Err(MomentsError::Transcript("connection reset".to_string()));
            }
            Ok(self.bodies.get(url).cloned())
        }
    }

    fn fast_options(languages: &[&str]) -> FetchOptions {
        FetchOptions {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            retries: 2,
            retry_delay: Duration::from_millis(1),
            cue_wait: Duration::from_millis(5),
            cue_retry_wait: Duration::from_millis(5),
            ..FetchOptions::default()
        }
    }

    const JSON_BODY: &str = r#"{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"hello"}]}]}"#;

    #[tokio::test]
    async fn test_first_non_empty_candidate_wins() {
        let json_url = "https://www.youtube.com/api/timedtext?v=vid&lang=en&fmt=json3";
        let mut transport = FakeTransport::default();
        // The raw candidate answers OK but empty.
        transport
            .bodies
            .insert("https://www.youtube.com/api/timedtext?v=vid&lang=en".to_string(), String::new());
        transport.bodies.insert(json_url.to_string(), JSON_BODY.to_string());
        let transport = Arc::new(transport);

        let fetcher = TranscriptFetcher::new(transport.clone());
        let fetched = fetcher.fetch("vid", &fast_options(&["en"])).await;

        assert_eq!(fetched.fragments.len(), 1);
        assert_eq!(fetched.report.outcome, FetchOutcome::Network { url: json_url.to_string() });
        assert_eq!(fetched.report.attempts, 1);

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0].contains("type=list"));
        assert_eq!(requests.last().unwrap(), json_url);
    }

    #[tokio::test]
    async fn test_errors_are_skipped() {
        let raw = "https://www.youtube.com/api/timedtext?v=vid&lang=en";
        let vtt = "https://www.youtube.com/api/timedtext?v=vid&lang=en&fmt=vtt";
        let mut transport = FakeTransport::default();
        transport.fail.push(raw.to_string());
        transport
            .bodies
            .insert(vtt.to_string(), "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nvia vtt\n".to_string());

        let fetcher = TranscriptFetcher::new(Arc::new(transport));
        let fetched = fetcher.fetch("vid", &fast_options(&["en"])).await;

        assert_eq!(fetched.fragments[0].text, "via vtt");
        let first = &fetched.report.tried[0];
        assert!(!first.ok);
        assert!(first.error.is_some());
    }

    #[tokio::test]
    async fn test_chosen_track_base_url_is_tried_first() {
        let base = "https://example.com/caption?id=1";
        let mut transport = FakeTransport::default();
        transport.bodies.insert(
            base.to_string(),
            r#"<transcript><text start="3" dur="1">from base</text></transcript>"#.to_string(),
        );
        let observer = StaticTracks(vec![CaptionTrack {
            language_code: "en".to_string(),
            base_url: base.to_string(),
            ..Default::default()
        }]);

        let fetcher = TranscriptFetcher::new(Arc::new(transport)).with_observer(Arc::new(observer));
        let fetched = fetcher.fetch("vid", &fast_options(&["en"])).await;

        assert_eq!(fetched.fragments[0].text, "from base");
        assert_eq!(fetched.report.tried.len(), 1);
        assert_eq!(fetched.report.tracks.player.len(), 1);
    }

    #[tokio::test]
    async fn test_network_fragments_are_sorted_by_start() {
        let raw = "https://www.youtube.com/api/timedtext?v=vid&lang=en";
        let mut transport = FakeTransport::default();
        transport.bodies.insert(
            raw.to_string(),
            r#"<transcript>
                <text start="9" dur="1">third</text>
                <text start="1" dur="1">first</text>
                <text start="4" dur="1">second</text>
            </transcript>"#
                .to_string(),
        );

        let fetcher = TranscriptFetcher::new(Arc::new(transport));
        let fetched = fetcher.fetch("vid", &fast_options(&["en"])).await;

        let texts: Vec<&str> = fetched.fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_media_fallback() {
        let track: Arc<dyn MediaTextTrack> = Arc::new(SidecarTrack::new(
            "captions",
            vec![Cue { start: 4.0, end: 5.0, text: "from media".to_string() }],
        ));
        struct One(Arc<dyn MediaTextTrack>);
        #[async_trait]
        impl MediaTextTracks for One {
            async fn text_tracks(&self) -> Vec<Arc<dyn MediaTextTrack>> {
                vec![self.0.clone()]
            }
        }

        let fetcher = TranscriptFetcher::new(Arc::new(FakeTransport::default())).with_media(Arc::new(One(track)));
        let fetched = fetcher.fetch("vid", &fast_options(&["en"])).await;

        assert_eq!(fetched.fragments[0].text, "from media");
        assert_eq!(fetched.report.outcome, FetchOutcome::MediaTextTracks { count: 1 });
    }

    #[tokio::test]
    async fn test_total_failure_is_empty_after_retries() {
        let transport = Arc::new(FakeTransport::default());
        let fetcher = TranscriptFetcher::new(transport.clone());
        let fetched = fetcher.fetch("vid", &fast_options(&["en-US"])).await;

        assert!(fetched.fragments.is_empty());
        assert_eq!(fetched.report.outcome, FetchOutcome::Failed);
        assert_eq!(fetched.report.attempts, 2);

        let listings = transport
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.contains("type=list"))
            .count();
        assert_eq!(listings, 2);
    }

    #[tokio::test]
    async fn test_first_success_stops_early() {
        let mut calls = Vec::new();
        let mut log = Vec::new();
        let result = first_success(
            vec![1, 2, 3, 4],
            |n| {
                calls.push(n);
                async move {
                    let record = CandidateAttempt { url: n.to_string(), ok: true, len: 0, error: None };
                    (record, (n % 2 == 0).then_some(n * 10))
                }
            },
            &mut log,
        )
        .await;

        assert_eq!(result, Some((2, 20)));
        assert_eq!(calls, vec![1, 2]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_options_dedupe_languages() {
        let settings = TranscriptSettings {
            languages: vec!["en".to_string(), "EN".to_string(), "".to_string(), "de".to_string()],
            ..Default::default()
        };
        let options = FetchOptions::from(&settings);
        assert_eq!(options.languages, vec!["en", "de"]);
    }
}
