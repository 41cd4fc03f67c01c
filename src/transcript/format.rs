//! Transcript export formats.

use super::TranscriptFragment;
use serde::Serialize;

/// Export formats for fetched transcripts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Srt,
    Vtt,
    /// One `[MM:SS] text` line per fragment.
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(format!("Unknown format: {}. Use json, srt, vtt, or text.", s)),
        }
    }
}

/// JSON shape of an exported transcript.
#[derive(Debug, Serialize)]
pub struct TranscriptExport<'a> {
    pub video_id: &'a str,
    pub duration_seconds: f64,
    pub fragments: &'a [TranscriptFragment],
}

impl<'a> TranscriptExport<'a> {
    pub fn new(video_id: &'a str, fragments: &'a [TranscriptFragment]) -> Self {
        Self {
            video_id,
            duration_seconds: fragments.iter().fold(0.0f64, |m, f| m.max(f.end)),
            fragments,
        }
    }
}

/// Render fragments in the requested format.
pub fn format_fragments(video_id: &str, fragments: &[TranscriptFragment], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&TranscriptExport::new(video_id, fragments))
            .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Srt => cue_file(fragments, String::new(), ','),
        OutputFormat::Vtt => cue_file(fragments, "WEBVTT\n\n".to_string(), '.'),
        OutputFormat::Text => fragments
            .iter()
            .map(|f| format!("[{}] {}\n", super::format_timestamp(f.start), f.text))
            .collect(),
    }
}

/// Numbered cues; SRT and WebVTT differ only in header and millisecond separator.
fn cue_file(fragments: &[TranscriptFragment], mut output: String, ms_separator: char) -> String {
    for (i, fragment) in fragments.iter().enumerate() {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            cue_timestamp(fragment.start, ms_separator),
            cue_timestamp(fragment.end, ms_separator),
            fragment.text
        ));
    }
    output
}

fn cue_timestamp(seconds: f64, ms_separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        ms_separator,
        total_ms % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TranscriptFragment> {
        vec![
            TranscriptFragment::new(0.0, 2.5, "Hello world.".to_string()),
            TranscriptFragment::new(62.5, 65.0, "A minute later.".to_string()),
        ]
    }

    #[test]
    fn test_format_json() {
        let json = format_fragments("abc123", &sample(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["video_id"], "abc123");
        assert_eq!(value["duration_seconds"], 65.0);
        assert_eq!(value["fragments"][1]["text"], "A minute later.");
    }

    #[test]
    fn test_format_srt_and_vtt() {
        let srt = format_fragments("v", &sample(), OutputFormat::Srt);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world."));

        let vtt = format_fragments("v", &sample(), OutputFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT\n\n1\n"));
        assert!(vtt.contains("00:01:02.500 --> 00:01:05.000"));
    }

    #[test]
    fn test_format_text() {
        let text = format_fragments("v", &sample(), OutputFormat::Text);
        assert_eq!(text, "[00:00] Hello world.\n[01:02] A minute later.\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
