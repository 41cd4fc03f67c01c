//! Caption payload parsers.
//!
//! The caption endpoint answers in one of three shapes depending on the
//! `fmt` parameter (and sometimes ignores it), so dispatch is by content:
//! JSON timed events, WebVTT, or XML.

use super::TranscriptFragment;
use crate::windows::collapse_whitespace;
use html_escape::decode_html_entities;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Anti-XSSI prefix some timedtext responses carry before the JSON body.
const XSSI_PREFIX: &str = ")]}'";

/// Duration assumed for the last JSON event when it carries none.
const DEFAULT_LAST_EVENT_MS: f64 = 2000.0;

static VTT_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(\d+):)?(\d{1,2}):(\d{1,2}(?:\.\d+)?)\s*-->\s*(?:(\d+):)?(\d{1,2}):(\d{1,2}(?:\.\d+)?)",
    )
    .expect("Invalid regex")
});

static XML_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("Invalid regex"));

static XML_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b([^>]*?)(?:/>|>(.*?)</p>)").expect("Invalid regex"));

static XML_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex")
});

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

/// Parse a caption response, choosing the parser from its content.
pub fn parse_response(body: &str) -> Vec<TranscriptFragment> {
    let trimmed = strip_xssi(body);
    if trimmed.starts_with('{') {
        parse_json3(body)
    } else if body.contains("-->") {
        parse_vtt(body)
    } else {
        parse_xml(body)
    }
}

fn strip_xssi(body: &str) -> &str {
    let payload = body.trim_start();
    match payload.strip_prefix(XSSI_PREFIX) {
        Some(rest) => rest.trim_start_matches(',').trim_start(),
        None => payload,
    }
}

/// Parse the timed-event JSON format (`fmt=json3`).
///
/// Each event carries `tStartMs`, an optional `dDurationMs` and `segs` with
/// inline `utf8` text. A missing duration runs to the next event's start,
/// or two seconds for the last event. Malformed input yields no fragments.
pub fn parse_json3(body: &str) -> Vec<TranscriptFragment> {
    let Ok(data) = serde_json::from_str::<Value>(strip_xssi(body)) else {
        return Vec::new();
    };
    let Some(events) = data.get("events").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut fragments = Vec::new();
    for (i, event) in events.iter().enumerate() {
        let start_ms = event.get("tStartMs").and_then(Value::as_f64).unwrap_or(0.0);
        let next_start_ms = events
            .get(i + 1)
            .and_then(|e| e.get("tStartMs"))
            .and_then(Value::as_f64);
        let duration_ms = event
            .get("dDurationMs")
            .and_then(Value::as_f64)
            .or_else(|| next_start_ms.map(|next| next - start_ms))
            .unwrap_or(DEFAULT_LAST_EVENT_MS);

        let start = start_ms / 1000.0;
        let end = start.max((start_ms + duration_ms.max(0.0)) / 1000.0);

        let text = event
            .get("segs")
            .and_then(Value::as_array)
            .map(|segs| {
                segs.iter()
                    .filter_map(|s| s.get("utf8").and_then(Value::as_str))
                    .filter(|t| !t.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let text = collapse_whitespace(&text);

        if !text.is_empty() {
            fragments.push(TranscriptFragment::new(start, end, text));
        }
    }

    fragments
}

fn vtt_seconds(hours: Option<&str>, minutes: &str, seconds: &str) -> f64 {
    let h: f64 = hours.and_then(|h| h.parse().ok()).unwrap_or(0.0);
    let m: f64 = minutes.parse().unwrap_or(0.0);
    let s: f64 = seconds.parse().unwrap_or(0.0);
    h * 3600.0 + m * 60.0 + s
}

fn parse_vtt_timing(line: &str) -> Option<(f64, f64)> {
    let caps = VTT_TIMING.captures(line)?;
    let start = vtt_seconds(caps.get(1).map(|m| m.as_str()), &caps[2], &caps[3]);
    let end = vtt_seconds(caps.get(4).map(|m| m.as_str()), &caps[5], &caps[6]);
    Some((start, end.max(start)))
}

/// Parse WebVTT.
///
/// Non-blank lines following a timing line form one cue. A cue id line
/// directly before a timing line is skipped, as are the `WEBVTT` header and
/// `NOTE` blocks. Inline markup such as `<c>` or karaoke timestamps is removed.
pub fn parse_vtt(body: &str) -> Vec<TranscriptFragment> {
    let lines: Vec<&str> = body.lines().collect();
    let mut fragments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let mut line = lines[i].trim();
        if line.is_empty() || starts_with_ignore_case(line, "WEBVTT") || starts_with_ignore_case(line, "NOTE") {
            i += 1;
            continue;
        }
        // Optional cue id.
        if !line.contains("-->") && i + 1 < lines.len() && lines[i + 1].contains("-->") {
            i += 1;
            line = lines[i].trim();
        }
        if !line.contains("-->") {
            i += 1;
            continue;
        }

        let timing = parse_vtt_timing(line);
        i += 1;

        let mut content = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            content.push(lines[i].trim());
            i += 1;
        }
        let text = strip_markup(&content.join(" "));

        if let Some((start, end)) = timing {
            if !text.is_empty() {
                fragments.push(TranscriptFragment::new(start, end, text));
            }
        }

        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
    }

    fragments
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.is_char_boundary(prefix.len())
        && line[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn attributes(raw: &str) -> Vec<(String, String)> {
    XML_ATTR
        .captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
            (c[1].to_string(), decode_html_entities(value).into_owned())
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// Decode caption text from XML content.
///
/// Caption XML escapes its text twice (`&amp;#39;`), so entities are decoded
/// once for the XML layer and once more for the HTML layer.
fn decode_caption_text(raw: &str) -> String {
    let once = decode_html_entities(raw);
    let twice = decode_html_entities(&once);
    collapse_whitespace(&strip_markup(&twice.replace('\n', " ")))
}

/// Parse caption XML.
///
/// Handles the legacy `<text start="s" dur="s">` format, and the srv3
/// `<p t="ms" d="ms">` format when no `<text>` elements are present.
pub fn parse_xml(body: &str) -> Vec<TranscriptFragment> {
    if body.contains("<transcript/>") {
        return Vec::new();
    }

    let mut fragments: Vec<TranscriptFragment> = XML_TEXT
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = attributes(&caps[1]);
            let start: f64 = attribute(&attrs, "start")?.parse().ok()?;
            let dur: f64 = attribute(&attrs, "dur").and_then(|d| d.parse().ok()).unwrap_or(0.0);
            let text = decode_caption_text(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            (!text.is_empty()).then(|| TranscriptFragment::new(start, start + dur.max(0.0), text))
        })
        .collect();

    if fragments.is_empty() {
        fragments = XML_PARAGRAPH
            .captures_iter(body)
            .filter_map(|caps| {
                let attrs = attributes(&caps[1]);
                let start_ms: f64 = attribute(&attrs, "t")?.parse().ok()?;
                let dur_ms: f64 = attribute(&attrs, "d").and_then(|d| d.parse().ok()).unwrap_or(0.0);
                let text = decode_caption_text(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
                let start = start_ms / 1000.0;
                (!text.is_empty())
                    .then(|| TranscriptFragment::new(start, start + dur_ms.max(0.0) / 1000.0, text))
            })
            .collect();
    }

    fragments
}

/// Replace simple markup tags with spaces and collapse whitespace.
pub fn strip_markup(text: &str) -> String {
    collapse_whitespace(&MARKUP.replace_all(text, " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let body = r#"{"events":[
            {"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"Hello"},{"utf8":" world"}]},
            {"tStartMs":1500,"segs":[{"utf8":"\n"}]},
            {"tStartMs":3000,"segs":[{"utf8":"next"}]},
            {"tStartMs":4000,"segs":[{"utf8":"last"}]}
        ]}"#;
        let fragments = parse_json3(body);

        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].text, "Hello world");
        assert_eq!((fragments[0].start, fragments[0].end), (0.0, 1.5));
        // Missing duration runs to the next event.
        assert_eq!((fragments[1].start, fragments[1].end), (3.0, 4.0));
        // Last event defaults to two seconds.
        assert_eq!((fragments[2].start, fragments[2].end), (4.0, 6.0));
    }

    #[test]
    fn test_parse_json3_with_xssi_prefix() {
        let body = ")]}'\n{\"events\":[{\"tStartMs\":500,\"dDurationMs\":500,\"segs\":[{\"utf8\":\"hi\"}]}]}";
        let fragments = parse_response(body);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].start, 0.5);
    }

    #[test]
    fn test_parse_json3_malformed() {
        assert!(parse_json3("{not json").is_empty());
        assert!(parse_json3(r#"{"other": 1}"#).is_empty());
    }

    #[test]
    fn test_parse_vtt() {
        let body = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                    1\n00:00:01.000 --> 00:00:03.500\nFirst line\nsecond line\n\n\
                    NOTE a comment\n\n\
                    00:01:02.000 --> 00:01:04.000 align:start\n<c>Tagged</c> text\n";
        let fragments = parse_vtt(body);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "First line second line");
        assert_eq!((fragments[0].start, fragments[0].end), (1.0, 3.5));
        assert_eq!(fragments[1].text, "Tagged text");
        assert_eq!(fragments[1].start, 62.0);
    }

    #[test]
    fn test_parse_vtt_short_timestamps() {
        let fragments = parse_vtt("WEBVTT\n\n01:02.500 --> 01:04.000\nshort form\n");
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].start, 62.5);
    }

    #[test]
    fn test_parse_legacy_xml() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.5" dur="2.1">It&amp;#39;s here</text>
            <text start="2.6" dur="1">two
lines</text>
            <text start="4" dur="1"></text>
        </transcript>"#;
        let fragments = parse_xml(body);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "It's here");
        assert!((fragments[0].end - 2.6).abs() < 1e-9);
        assert_eq!(fragments[1].text, "two lines");
    }

    #[test]
    fn test_single_quoted_attributes() {
        let body = "<transcript><text start='2.5' dur='1.5'>quoted</text><text start=\"5\" dur='1'>mixed</text></transcript>";
        let fragments = parse_xml(body);

        assert_eq!(fragments.len(), 2);
        assert_eq!((fragments[0].start, fragments[0].end), (2.5, 4.0));
        assert_eq!((fragments[1].start, fragments[1].end), (5.0, 6.0));
    }

    #[test]
    fn test_parse_srv3_xml() {
        let body = r#"<timedtext format="3"><body>
            <p t="1000" d="2000"><s>hello</s><s> there</s></p>
        </body></timedtext>"#;
        let fragments = parse_response(body);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "hello there");
        assert_eq!((fragments[0].start, fragments[0].end), (1.0, 3.0));
    }

    #[test]
    fn test_empty_transcript_xml() {
        assert!(parse_response("<transcript/>").is_empty());
        assert!(parse_response("").is_empty());
    }

    #[test]
    fn test_dispatch_by_content() {
        assert_eq!(parse_response("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nvtt\n")[0].text, "vtt");
        assert_eq!(parse_response(r#"<transcript><text start="1" dur="1">xml</text></transcript>"#)[0].text, "xml");
    }
}
