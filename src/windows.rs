//! Fixed-duration transcript windows.
//!
//! Windows are the retrieval unit for comment matching: short enough to pin a
//! comment to a moment, long enough to carry a few sentences of context.

use crate::transcript::TranscriptFragment;
use serde::{Deserialize, Serialize};

/// A time window over the transcript with the text spoken during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWindow {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Whitespace-normalized text of every fragment overlapping the window.
    pub text: String,
}

impl TranscriptWindow {
    /// Format the window start as MM:SS or HH:MM:SS.
    pub fn format_timestamp(&self) -> String {
        crate::transcript::format_timestamp(self.start)
    }
}

/// Tile `[0, max fragment end]` into windows of `window_size_sec`.
///
/// A fragment belongs to every window its interval touches, boundaries
/// included, so a fragment spanning a boundary appears in both windows.
/// Windows with no text are omitted.
pub fn build_windows(fragments: &[TranscriptFragment], window_size_sec: f64) -> Vec<TranscriptWindow> {
    let mut windows = Vec::new();
    if fragments.is_empty() || !(window_size_sec > 0.0) {
        return windows;
    }

    let total_end = fragments.iter().fold(0.0f64, |m, f| m.max(f.end));

    let mut step = 0u64;
    loop {
        let window_start = step as f64 * window_size_sec;
        if window_start >= total_end {
            break;
        }
        let window_end = (window_start + window_size_sec).min(total_end);

        let text = fragments
            .iter()
            .filter(|f| !(f.end < window_start || f.start > window_end))
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = collapse_whitespace(&text);

        if !text.is_empty() {
            windows.push(TranscriptWindow {
                start: window_start,
                end: window_end,
                text,
            });
        }

        step += 1;
    }

    windows
}

/// Collapse every whitespace run into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(start: f64, end: f64, text: &str) -> TranscriptFragment {
        TranscriptFragment::new(start, end, text.to_string())
    }

    #[test]
    fn test_window_tiling() {
        let fragments = vec![frag(0.0, 3.0, "a"), frag(3.0, 6.0, "b"), frag(6.0, 9.0, "c")];
        let windows = build_windows(&fragments, 5.0);

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (0.0, 5.0));
        assert_eq!(windows[0].text, "a b");
        assert_eq!((windows[1].start, windows[1].end), (5.0, 9.0));
        assert_eq!(windows[1].text, "b c");
    }

    #[test]
    fn test_transcript_ending_on_boundary() {
        let fragments = vec![frag(0.0, 5.0, "a"), frag(5.0, 10.0, "b")];
        let windows = build_windows(&fragments, 5.0);

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[1].start, windows[1].end), (5.0, 10.0));
        assert!(windows.iter().all(|w| w.end > w.start));
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_windows_are_contiguous() {
        let fragments: Vec<_> = (0..20)
            .map(|i| frag(i as f64 * 2.0, i as f64 * 2.0 + 2.0, "word"))
            .collect();
        let windows = build_windows(&fragments, 7.0);

        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(windows.last().unwrap().end, 40.0);
        assert!(windows.iter().all(|w| !w.text.is_empty()));
    }

    #[test]
    fn test_gaps_are_omitted() {
        let fragments = vec![frag(0.0, 2.0, "intro"), frag(31.0, 33.0, "outro")];
        let windows = build_windows(&fragments, 10.0);

        let starts: Vec<f64> = windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0.0, 30.0]);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let fragments = vec![frag(0.0, 1.0, "  hello \n"), frag(1.0, 2.0, "\tworld  ")];
        let windows = build_windows(&fragments, 5.0);
        assert_eq!(windows[0].text, "hello world");
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(build_windows(&[], 7.0).is_empty());
        assert!(build_windows(&[frag(0.0, 3.0, "a")], 0.0).is_empty());
        assert!(build_windows(&[frag(0.0, 3.0, "a")], f64::NAN).is_empty());
    }
}
