//! Caption track discovery and selection.

use super::candidates::{base_language, TIMEDTEXT_ENDPOINT};
use super::transport::CaptionTransport;
use super::CaptionTrack;
use crate::error::Result;
use async_trait::async_trait;
use html_escape::decode_html_entities;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static TRACK_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<track\b([^>]*)/?>").expect("Invalid regex"));

static TRACK_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex")
});

/// Source of tracks already known to the player for a video.
///
/// This is the passive half of discovery: whatever the player advertised
/// without an explicit listing request.
#[async_trait]
pub trait TrackObserver: Send + Sync {
    async fn observed_tracks(&self, video_id: &str) -> Vec<CaptionTrack>;
}

/// Observer that never knows of any tracks.
pub struct NoObserver;

#[async_trait]
impl TrackObserver for NoObserver {
    async fn observed_tracks(&self, _video_id: &str) -> Vec<CaptionTrack> {
        Vec::new()
    }
}

/// Observer returning a fixed set of tracks.
pub struct StaticTracks(pub Vec<CaptionTrack>);

#[async_trait]
impl TrackObserver for StaticTracks {
    async fn observed_tracks(&self, _video_id: &str) -> Vec<CaptionTrack> {
        self.0.clone()
    }
}

/// Reads the player's caption tracks from the watch page.
pub struct WatchPageObserver {
    transport: Arc<dyn CaptionTransport>,
}

impl WatchPageObserver {
    pub fn new(transport: Arc<dyn CaptionTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TrackObserver for WatchPageObserver {
    async fn observed_tracks(&self, video_id: &str) -> Vec<CaptionTrack> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        match self.transport.get_text(&url).await {
            Ok(Some(html)) => parse_player_tracks(&html),
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!("Watch page fetch failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Merge track lists, keeping the first occurrence of each identity key.
pub fn merge_tracks(sources: &[Vec<CaptionTrack>]) -> Vec<CaptionTrack> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .flatten()
        .filter(|t| seen.insert(t.identity_key()))
        .cloned()
        .collect()
}

/// Preference score of a track for the given language order.
///
/// Exact and base-language matches are additive, so an exact match also
/// earns the base-language bonus.
pub fn track_score(track: &CaptionTrack, languages: &[String]) -> i32 {
    let code = track.language_code.to_lowercase();
    let base = base_language(&code);

    let mut score = 0;
    if languages.iter().any(|l| l.to_lowercase() == code) {
        score += 5;
    }
    if languages.iter().any(|l| base_language(&l.to_lowercase()) == base) {
        score += 4;
    }
    if track.kind.is_empty() {
        score += 3;
    }
    if track.is_auto_generated() {
        score += 1;
    }
    if track.is_default {
        score += 1;
    }
    score
}

/// Pick the best-scoring track; ties go to the earliest discovered.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    let mut best: Option<(&CaptionTrack, i32)> = None;
    for track in tracks {
        let score = track_score(track, languages);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((track, score));
        }
    }
    best.map(|(t, _)| t)
}

/// Parse the XML track listing returned by `type=list` requests.
pub fn parse_track_list(xml: &str) -> Vec<CaptionTrack> {
    TRACK_ELEMENT
        .captures_iter(xml)
        .map(|caps| {
            let mut track = CaptionTrack::default();
            for attr in TRACK_ATTR.captures_iter(&caps[1]) {
                let raw = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
                let value = decode_html_entities(raw).into_owned();
                match &attr[1] {
                    "lang_code" => track.language_code = value,
                    "kind" => track.kind = value,
                    "name" => track.name = value,
                    "vss_id" => track.vss_id = value,
                    "baseUrl" => track.base_url = value,
                    "lang_default" => track.is_default = value == "true",
                    _ => {}
                }
            }
            track
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerTrack {
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    vss_id: String,
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    is_default: bool,
}

fn display_name(name: Option<&Value>) -> String {
    match name {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => {
            if let Some(text) = obj.get("simpleText").and_then(Value::as_str) {
                text.to_string()
            } else {
                obj.get("runs")
                    .and_then(Value::as_array)
                    .map(|runs| {
                        runs.iter()
                            .filter_map(|r| r.get("text").and_then(Value::as_str))
                            .collect::<String>()
                    })
                    .unwrap_or_default()
            }
        }
        _ => String::new(),
    }
}

/// Extract the player's `captionTracks` array from watch-page HTML.
pub fn parse_player_tracks(html: &str) -> Vec<CaptionTrack> {
    let Some(pos) = html.find("\"captionTracks\":") else {
        return Vec::new();
    };
    let rest = &html[pos + "\"captionTracks\":".len()..];

    // The array is embedded in a larger script; read exactly one JSON value.
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Vec<PlayerTrack>>();
    match stream.next() {
        Some(Ok(tracks)) => tracks
            .into_iter()
            .map(|t| CaptionTrack {
                name: display_name(t.name.as_ref()),
                language_code: t.language_code,
                kind: t.kind,
                vss_id: t.vss_id,
                base_url: t.base_url,
                is_default: t.is_default,
            })
            .collect(),
        Some(Err(e)) => {
            debug!("Failed to parse captionTracks: {}", e);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Request the platform's track listing for a video.
pub(crate) async fn list_tracks(
    transport: &dyn CaptionTransport,
    video_id: &str,
    ui_language: &str,
) -> Result<Vec<CaptionTrack>> {
    let mut url = url::Url::parse(TIMEDTEXT_ENDPOINT)
        .map_err(|e| crate::error::MomentsError::Transcript(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("type", "list")
        .append_pair("v", video_id)
        .append_pair("hl", ui_language);

    Ok(match transport.get_text(url.as_str()).await? {
        Some(xml) if !xml.trim().is_empty() => parse_track_list(&xml),
        _ => Vec::new(),
    })
}

/// Compact view of a track for diagnostics output.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub lang: String,
    pub kind: String,
    pub name: String,
    pub vss: String,
    pub base: bool,
    pub def: bool,
}

impl From<&CaptionTrack> for TrackSummary {
    fn from(track: &CaptionTrack) -> Self {
        Self {
            lang: track.language_code.clone(),
            kind: track.kind.clone(),
            name: track.name.clone(),
            vss: track.vss_id.clone(),
            base: !track.base_url.is_empty(),
            def: track.is_default,
        }
    }
}

/// Tracks seen through each discovery source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackDiagnostics {
    pub player: Vec<TrackSummary>,
    pub list: Vec<TrackSummary>,
}

impl TrackDiagnostics {
    pub fn new(player: &[CaptionTrack], list: &[CaptionTrack]) -> Self {
        Self {
            player: player.iter().map(TrackSummary::from).collect(),
            list: list.iter().map(TrackSummary::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.player.is_empty() && self.list.is_empty()
    }
}
