//! Pipeline orchestrator for ytmoments.
//!
//! Coordinates one analysis run per video: cache lookup, transcript
//! acquisition, windowing, comment matching, scoring and deduplication.

use crate::assist::{ensure_session, Assistant, LanguageModel, OpenAiModel, OpenAiSummarizer, Summarizer, Unavailable, WindowCandidate};
use crate::cache::{MemoryMomentCache, MomentCache, NoCache, SqliteMomentCache};
use crate::cluster::{cluster, ClusterOptions};
use crate::comments::{most_frequent_mention, Comment, CommentSource, YoutubeCommentSource};
use crate::config::{AnalysisMode, ModelProvider, Prompts, Settings};
use crate::error::Result;
use crate::moments::{dedupe, rank, score, Moment};
use crate::retrieval::{Index, SearchHit};
use crate::transcript::{
    FetchOptions, FetchReport, FetchedTranscript, HttpTransport, MediaTextTracks, TrackDiagnostics,
    TranscriptFetcher, WatchPageObserver,
};
use crate::windows::{build_windows, TranscriptWindow};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const MENTION_REASON: &str = "Timestamp mentioned in comments";
const SAMPLE_COMMENTS: usize = 3;

/// Where a run's moments came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentSource {
    Cache,
    Network,
}

/// Progress and terminal states of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StatusEvent {
    Starting { video_id: String },
    NoTranscript { tracks: TrackDiagnostics },
    NoApiKey,
    NoComments,
    NoTimestamps,
    Done { from: MomentSource, count: usize },
}

impl StatusEvent {
    /// Human-readable summary for terminals and logs.
    pub fn describe(&self) -> String {
        match self {
            StatusEvent::Starting { video_id } => format!("Analyzing {}", video_id),
            StatusEvent::NoTranscript { .. } => "No transcript available for this video".to_string(),
            StatusEvent::NoApiKey => "No YouTube API key configured".to_string(),
            StatusEvent::NoComments => "No comments found".to_string(),
            StatusEvent::NoTimestamps => "No timestamped comments found yet".to_string(),
            StatusEvent::Done { from, count } => {
                let from = match from {
                    MomentSource::Cache => "cache",
                    MomentSource::Network => "network",
                };
                format!("Found {} moments (from {})", count, from)
            }
        }
    }
}

/// Per-run overrides of the configured behavior.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub mode: Option<AnalysisMode>,
    /// Read and write the moment cache.
    pub use_cache: bool,
    pub window_size_seconds: Option<f64>,
    pub languages: Option<Vec<String>>,
    pub forced_vss_ids: Vec<String>,
    /// Receives every status event as it happens.
    pub events: Option<UnboundedSender<StatusEvent>>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            mode: None,
            use_cache: true,
            window_size_seconds: None,
            languages: None,
            forced_vss_ids: Vec::new(),
            events: None,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub video_id: String,
    /// Ranked best-first.
    pub moments: Vec<Moment>,
    /// The terminal status of the run.
    pub status: StatusEvent,
    pub window_count: usize,
    pub comment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FetchReport>,
}

/// Releases the in-flight slot when dropped.
struct InFlight<'a> {
    slot: &'a Mutex<Option<Uuid>>,
    token: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if *slot == Some(self.token) {
            *slot = None;
        }
    }
}

/// The main orchestrator for the moments pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    fetcher: TranscriptFetcher,
    comments: Option<Arc<dyn CommentSource>>,
    model: Arc<dyn LanguageModel>,
    summarizer: Option<Arc<dyn Summarizer>>,
    cache: Arc<dyn MomentCache>,
    in_flight: Mutex<Option<Uuid>>,
}

impl Orchestrator {
    /// Create an orchestrator wired to the real services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let transport = Arc::new(HttpTransport::new()?);
        let fetcher = TranscriptFetcher::new(transport.clone())
            .with_observer(Arc::new(WatchPageObserver::new(transport)));

        let comments: Option<Arc<dyn CommentSource>> = settings
            .youtube
            .resolved_api_key()
            .map(|key| Arc::new(YoutubeCommentSource::new(key)) as Arc<dyn CommentSource>);

        let (model, summarizer): (Arc<dyn LanguageModel>, Option<Arc<dyn Summarizer>>) =
            match settings.model.provider {
                ModelProvider::None => (Arc::new(Unavailable), None),
                ModelProvider::OpenAI => {
                    info!("Using OpenAI model {}", settings.model.model);
                    let summarizer = OpenAiSummarizer::new(&settings.model.model, &prompts.title.summarize)?
                        .map(|s| Arc::new(s) as Arc<dyn Summarizer>);
                    (Arc::new(OpenAiModel::new(&settings.model.model)), summarizer)
                }
            };

        let cache = Self::open_cache(&settings);

        Ok(Self::with_components(settings, fetcher, comments, model, summarizer, cache).with_prompts(prompts))
    }

    fn open_cache(settings: &Settings) -> Arc<dyn MomentCache> {
        if !settings.cache.enabled {
            return Arc::new(NoCache);
        }
        let ttl = chrono::Duration::hours(settings.cache.ttl_hours as i64);
        match SqliteMomentCache::new(&settings.cache_path(), ttl) {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                warn!("Falling back to in-memory cache: {}", e);
                Arc::new(MemoryMomentCache::new(ttl))
            }
        }
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        fetcher: TranscriptFetcher,
        comments: Option<Arc<dyn CommentSource>>,
        model: Arc<dyn LanguageModel>,
        summarizer: Option<Arc<dyn Summarizer>>,
        cache: Arc<dyn MomentCache>,
    ) -> Self {
        Self {
            settings,
            prompts: Prompts::default(),
            fetcher,
            comments,
            model,
            summarizer,
            cache,
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Use these media text tracks as the last transcript fallback.
    pub fn with_media(mut self, media: Arc<dyn MediaTextTracks>) -> Self {
        self.fetcher = self.fetcher.with_media(media);
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fetcher(&self) -> &TranscriptFetcher {
        &self.fetcher
    }

    /// Watch URL that starts playback at `seconds`.
    pub fn seek_url(&self, video_id: &str, seconds: f64) -> String {
        crate::video::seek_url(video_id, seconds)
    }

    /// Whether a run is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.lock().map(|slot| slot.is_some()).unwrap_or(true)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return None;
        }
        let token = Uuid::new_v4();
        *slot = Some(token);
        Some(InFlight {
            slot: &self.in_flight,
            token,
        })
    }

    fn fetch_options(&self, options: &AnalyzeOptions) -> FetchOptions {
        let mut fetch = FetchOptions::from(&self.settings.transcript);
        if let Some(languages) = &options.languages {
            fetch.languages = languages.clone();
        }
        fetch.forced_vss_ids = options.forced_vss_ids.clone();
        fetch
    }

    fn window_size(&self, options: &AnalyzeOptions) -> f64 {
        options
            .window_size_seconds
            .unwrap_or(self.settings.transcript.window_size_seconds)
    }

    /// Fetch the transcript and cut it into windows.
    pub async fn transcript_windows(
        &self,
        video_id: &str,
        options: &AnalyzeOptions,
    ) -> (FetchedTranscript, Vec<TranscriptWindow>) {
        let fetched = self.fetcher.fetch(video_id, &self.fetch_options(options)).await;
        let windows = build_windows(&fetched.fragments, self.window_size(options));
        (fetched, windows)
    }

    /// Transcript windows that best match a free-text query.
    pub async fn search_transcript(
        &self,
        video_id: &str,
        query: &str,
        limit: usize,
        options: &AnalyzeOptions,
    ) -> Vec<(SearchHit, TranscriptWindow)> {
        let (_, windows) = self.transcript_windows(video_id, options).await;
        let texts: Vec<&str> = windows.iter().map(|w| w.text.as_str()).collect();
        let index = Index::build(&texts);
        index
            .search(query, limit)
            .into_iter()
            .filter_map(|hit| windows.get(hit.doc_id).cloned().map(|w| (hit, w)))
            .collect()
    }

    /// Run the pipeline for a video.
    ///
    /// Returns `Ok(None)` without doing anything when another run is already
    /// in flight.
    #[instrument(skip(self, options))]
    pub async fn analyze(&self, video_id: &str, options: AnalyzeOptions) -> Result<Option<Analysis>> {
        let Some(_guard) = self.try_begin() else {
            debug!("Analysis already in flight, ignoring request for {}", video_id);
            return Ok(None);
        };
        let events = options.events.clone();
        let emit = |event: StatusEvent| {
            info!("{}", event.describe());
            if let Some(tx) = &events {
                let _ = tx.send(event.clone());
            }
            event
        };

        emit(StatusEvent::Starting {
            video_id: video_id.to_string(),
        });

        let mut analysis = Analysis {
            video_id: video_id.to_string(),
            moments: Vec::new(),
            status: StatusEvent::NoTranscript {
                tracks: TrackDiagnostics::default(),
            },
            window_count: 0,
            comment_count: 0,
            report: None,
        };

        if options.use_cache {
            if let Some(cached) = self.cache.load(video_id).await {
                analysis.status = emit(StatusEvent::Done {
                    from: MomentSource::Cache,
                    count: cached.len(),
                });
                analysis.moments = cached;
                return Ok(Some(analysis));
            }
        }

        let (fetched, windows) = self.transcript_windows(video_id, &options).await;
        analysis.window_count = windows.len();
        analysis.report = Some(fetched.report.clone());
        if windows.is_empty() {
            analysis.status = emit(StatusEvent::NoTranscript {
                tracks: fetched.report.tracks,
            });
            return Ok(Some(analysis));
        }

        let Some(source) = &self.comments else {
            analysis.status = emit(StatusEvent::NoApiKey);
            return Ok(Some(analysis));
        };
        let comments = source.fetch_top_comments(video_id).await;
        analysis.comment_count = comments.len();
        if comments.is_empty() {
            analysis.status = emit(StatusEvent::NoComments);
            return Ok(Some(analysis));
        }

        let session = ensure_session(self.model.as_ref()).await;
        let assistant = Assistant::new(session, self.summarizer.clone()).with_prompts(self.prompts.clone());

        let texts: Vec<&str> = windows.iter().map(|w| w.text.as_str()).collect();
        let window_index = Index::build(&texts);

        let mode = options.mode.unwrap_or(self.settings.analysis.mode);
        let moments = match mode {
            AnalysisMode::Transcript => {
                self.transcript_moments(&assistant, &window_index, &windows, &comments)
                    .await
            }
            AnalysisMode::Cluster => {
                self.cluster_moments(&assistant, &window_index, &windows, &comments, self.window_size(&options))
                    .await
            }
        };

        if moments.is_empty() {
            analysis.status = emit(StatusEvent::NoTimestamps);
            return Ok(Some(analysis));
        }

        let analysis_settings = &self.settings.analysis;
        let moments = rank(
            dedupe(moments, analysis_settings.dedupe_window_seconds),
            analysis_settings.max_moments,
        );

        if options.use_cache {
            self.cache.save(video_id, &moments).await;
        }

        analysis.status = emit(StatusEvent::Done {
            from: MomentSource::Network,
            count: moments.len(),
        });
        analysis.moments = moments;
        Ok(Some(analysis))
    }

    fn candidates(hits: &[SearchHit], windows: &[TranscriptWindow]) -> Vec<WindowCandidate> {
        hits.iter()
            .filter_map(|hit| windows.get(hit.doc_id))
            .map(|w| WindowCandidate {
                start: w.start,
                end: w.end,
                text: w.text.clone(),
            })
            .collect()
    }

    /// One moment per comment that matches a transcript window.
    async fn transcript_moments(
        &self,
        assistant: &Assistant,
        index: &Index,
        windows: &[TranscriptWindow],
        comments: &[Comment],
    ) -> Vec<Moment> {
        let k = self.settings.analysis.search_k;
        let mut moments = Vec::new();

        for comment in comments {
            let hits = index.search(&comment.text, k);
            let candidates = Self::candidates(&hits, windows);
            let Some(pick) = assistant.pick_best_window(&comment.text, &candidates).await else {
                continue;
            };
            let classification = assistant.classify_emotion(&comment.text).await;

            // Similarity of the window actually picked, or the top hit when
            // the pick does not line up with a window.
            let picked = hits
                .iter()
                .find(|h| windows.get(h.doc_id).is_some_and(|w| w.start == pick.start))
                .or(hits.first());
            let similarity = picked.map(|h| index.coverage(&comment.text, h.doc_id)).unwrap_or(0.0);

            let top_text = candidates.first().map(|c| c.text.as_str()).unwrap_or("");
            let title = assistant.generate_title(top_text, &comment.text).await;

            let start = pick.start.max(0.0);
            moments.push(Moment {
                start,
                end: pick.end.max(start),
                reason: pick.reason,
                emotion: classification.emotion,
                confidence: classification.confidence,
                comment: comment.text.clone(),
                likes: comment.likes,
                title,
                score: score(similarity, comment.likes, classification.confidence, 0.0),
                cluster_size: None,
                total_likes: None,
                sample_comments: Vec::new(),
                anchor_author: None,
                anchor_likes: None,
            });
        }

        moments
    }

    /// One moment per cluster of similar comments, anchored on liked comments.
    async fn cluster_moments(
        &self,
        assistant: &Assistant,
        window_index: &Index,
        windows: &[TranscriptWindow],
        comments: &[Comment],
        window_size: f64,
    ) -> Vec<Moment> {
        let settings = &self.settings.analysis;
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        let comment_index = Index::build(&texts);
        let options = ClusterOptions {
            k: settings.cluster_k,
            min_normalized_score: settings.cluster_min_score,
        };

        let mut anchors: Vec<usize> = (0..comments.len()).collect();
        anchors.sort_by(|a, b| comments[*b].likes.cmp(&comments[*a].likes));

        let mut clustered: HashSet<usize> = HashSet::new();
        let mut moments = Vec::new();
        let mut anchors_used = 0;

        for anchor in anchors {
            if anchors_used >= settings.max_anchors {
                break;
            }
            if clustered.contains(&anchor) {
                continue;
            }
            anchors_used += 1;

            let members = cluster(&comment_index, comments, anchor, options);
            if members.len() < settings.min_cluster_size.max(1) {
                debug!("Cluster for comment {} too small ({})", anchor, members.len());
                continue;
            }
            clustered.extend(members.iter().map(|m| m.index));

            let anchor_comment = &comments[anchor];
            let mention_texts = std::iter::once(anchor_comment.text.as_str())
                .chain(members.iter().filter(|m| !m.is_anchor).map(|m| m.comment.text.as_str()));

            let (start, end, reason, title_text) = match most_frequent_mention(mention_texts) {
                Some(t) => {
                    let window = windows.iter().find(|w| w.start <= t && t <= w.end);
                    let end = window.map(|w| w.end.max(t)).unwrap_or(t + window_size);
                    let title_text = window.map(|w| w.text.clone()).unwrap_or_else(|| anchor_comment.text.clone());
                    (t, end, MENTION_REASON.to_string(), title_text)
                }
                None => {
                    let joined = members.iter().map(|m| m.comment.text.as_str()).collect::<Vec<_>>().join(" ");
                    let hits = window_index.search(&joined, settings.search_k);
                    let candidates = Self::candidates(&hits, windows);
                    let Some(pick) = assistant.pick_best_window(&joined, &candidates).await else {
                        continue;
                    };
                    let title_text = candidates.first().map(|c| c.text.clone()).unwrap_or_default();
                    (pick.start, pick.end, pick.reason, title_text)
                }
            };

            let classification = assistant.classify_emotion(&anchor_comment.text).await;
            let title = assistant.generate_title(&title_text, &anchor_comment.text).await;

            let similarity = members.iter().map(|m| m.score).sum::<f64>() / members.len() as f64;
            let total_likes: u64 = members.iter().map(|m| m.comment.likes).sum();
            let start = start.max(0.0);

            moments.push(Moment {
                start,
                end: end.max(start),
                reason,
                emotion: classification.emotion,
                confidence: classification.confidence,
                comment: anchor_comment.text.clone(),
                likes: total_likes,
                title,
                score: score(similarity.clamp(0.0, 1.0), total_likes, classification.confidence, 0.0),
                cluster_size: Some(members.len()),
                total_likes: Some(total_likes),
                sample_comments: members
                    .iter()
                    .take(SAMPLE_COMMENTS)
                    .map(|m| m.comment.text.clone())
                    .collect(),
                anchor_author: Some(anchor_comment.author.clone()).filter(|a| !a.is_empty()),
                anchor_likes: Some(anchor_comment.likes),
            });
        }

        moments
    }
}
