//! Ranked caption URL candidates.

use super::CaptionTrack;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Public caption endpoint.
pub const TIMEDTEXT_ENDPOINT: &str = "https://www.youtube.com/api/timedtext";

/// How a candidate identifies the caption track it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A track's own base URL.
    BaseUrl(String),
    /// `vss_id=` on the public endpoint.
    VssId(String),
    /// `lang=`, `kind=` and `name=` on the public endpoint.
    Track { lang: String, kind: String, name: String },
    /// `lang=` only.
    Lang(String),
}

/// Response format requested through the `fmt` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFormat {
    /// No `fmt` parameter; the server default (usually legacy XML).
    Raw,
    Json3,
    Srv3,
    Vtt,
}

impl TransportFormat {
    /// Formats in the order they are tried for every selector.
    pub const ALL: [TransportFormat; 4] = [
        TransportFormat::Raw,
        TransportFormat::Json3,
        TransportFormat::Srv3,
        TransportFormat::Vtt,
    ];

    fn param(self) -> Option<&'static str> {
        match self {
            TransportFormat::Raw => None,
            TransportFormat::Json3 => Some("json3"),
            TransportFormat::Srv3 => Some("srv3"),
            TransportFormat::Vtt => Some("vtt"),
        }
    }
}

impl fmt::Display for TransportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param().unwrap_or("raw"))
    }
}

/// One caption URL to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub selector: Selector,
    pub format: TransportFormat,
    pub url: String,
}

/// Set (or replace) the `fmt` query parameter of `base`.
///
/// The raw form is `base` exactly as the player gave it.
fn with_format(base: &str, format: TransportFormat) -> String {
    let Some(fmt) = format.param() else {
        return base.to_string();
    };
    let Ok(mut url) = Url::parse(base) else {
        return if base.contains('?') {
            format!("{}&fmt={}", base, fmt)
        } else {
            format!("{}?fmt={}", base, fmt)
        };
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        query.append_pair("fmt", fmt);
    }
    url.to_string()
}

fn endpoint_url(video_id: &str, params: &[(&str, &str)], format: TransportFormat) -> String {
    let mut url = match Url::parse(TIMEDTEXT_ENDPOINT) {
        Ok(url) => url,
        Err(_) => return String::new(),
    };
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("v", video_id);
        for (k, v) in params {
            query.append_pair(k, v);
        }
        if let Some(fmt) = format.param() {
            query.append_pair("fmt", fmt);
        }
    }
    url.to_string()
}

/// Base language of a tag: `en-US` becomes `en`.
pub fn base_language(lang: &str) -> &str {
    lang.split(['-', '_']).next().unwrap_or(lang)
}

struct CandidateList {
    seen: HashSet<String>,
    items: Vec<Candidate>,
}

impl CandidateList {
    fn push(&mut self, selector: Selector, format: TransportFormat, url: String) {
        if !url.is_empty() && self.seen.insert(url.clone()) {
            self.items.push(Candidate { selector, format, url });
        }
    }

    fn push_track(&mut self, video_id: &str, track: &CaptionTrack) {
        if !track.base_url.is_empty() {
            for format in TransportFormat::ALL {
                let url = with_format(&track.base_url, format);
                self.push(Selector::BaseUrl(track.base_url.clone()), format, url);
            }
        }
        if !track.vss_id.is_empty() {
            self.push_vss(video_id, &track.vss_id);
        }
        if !track.language_code.is_empty() {
            for format in TransportFormat::ALL {
                let mut params = vec![("lang", track.language_code.as_str())];
                if !track.kind.is_empty() {
                    params.push(("kind", track.kind.as_str()));
                }
                if !track.name.is_empty() {
                    params.push(("name", track.name.as_str()));
                }
                let url = endpoint_url(video_id, &params, format);
                self.push(
                    Selector::Track {
                        lang: track.language_code.clone(),
                        kind: track.kind.clone(),
                        name: track.name.clone(),
                    },
                    format,
                    url,
                );
            }
        }
    }

    fn push_vss(&mut self, video_id: &str, vss_id: &str) {
        for format in TransportFormat::ALL {
            let url = endpoint_url(video_id, &[("vss_id", vss_id)], format);
            self.push(Selector::VssId(vss_id.to_string()), format, url);
        }
    }

    fn push_language(&mut self, video_id: &str, lang: &str) {
        for format in TransportFormat::ALL {
            let url = endpoint_url(video_id, &[("lang", lang)], format);
            self.push(Selector::Lang(lang.to_string()), format, url);
        }
        self.push_vss(video_id, &format!("a.{}", lang));
    }
}

/// Build the ordered, deduplicated list of caption URLs to try.
///
/// Order: the chosen track, every other known track, each preferred
/// language (then its base language) by `lang=` and by auto-generated
/// `vss_id=a.<lang>`, and finally any forced vss ids. Every selector is
/// tried in raw, json3, srv3 and vtt form.
pub fn build_candidates(
    video_id: &str,
    chosen: Option<&CaptionTrack>,
    tracks: &[CaptionTrack],
    languages: &[String],
    forced_vss_ids: &[String],
) -> Vec<Candidate> {
    let mut list = CandidateList {
        seen: HashSet::new(),
        items: Vec::new(),
    };

    if let Some(track) = chosen {
        list.push_track(video_id, track);
    }
    for track in tracks {
        if Some(track) != chosen {
            list.push_track(video_id, track);
        }
    }

    for lang in languages {
        list.push_language(video_id, lang);
        let base = base_language(lang);
        if base != lang {
            list.push_language(video_id, base);
        }
    }

    for vss in forced_vss_ids {
        list.push_vss(video_id, vss);
    }

    list.items
}
