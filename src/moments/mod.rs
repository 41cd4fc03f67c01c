//! Moments: time-coded highlights derived from viewer comments.

mod scoring;

pub use scoring::{dedupe, likes_signal, rank, score};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed emotion label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Funny,
    Sad,
    Wholesome,
    Insightful,
    Angry,
    Wtf,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Funny,
        Emotion::Sad,
        Emotion::Wholesome,
        Emotion::Insightful,
        Emotion::Angry,
        Emotion::Wtf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Funny => "funny",
            Emotion::Sad => "sad",
            Emotion::Wholesome => "wholesome",
            Emotion::Insightful => "insightful",
            Emotion::Angry => "angry",
            Emotion::Wtf => "wtf",
        }
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Insightful
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    /// Exact label match; anything outside the set is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("Unknown emotion: {}", s))
    }
}

/// A ranked, time-coded highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    pub start: f64,
    pub end: f64,
    /// Why this time range was picked.
    pub reason: String,
    pub emotion: Emotion,
    pub confidence: f64,
    /// Text of the comment the moment was derived from.
    pub comment: String,
    pub likes: u64,
    pub title: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_likes: Option<u64>,
}

impl Moment {
    /// Format the start time as MM:SS or HH:MM:SS.
    pub fn format_timestamp(&self) -> String {
        crate::transcript::format_timestamp(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_labels() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.as_str().parse::<Emotion>().unwrap(), emotion);
        }
        assert!("Funny".parse::<Emotion>().is_err());
        assert!("bored".parse::<Emotion>().is_err());
        assert_eq!(serde_json::to_string(&Emotion::Wtf).unwrap(), "\"wtf\"");
    }

    #[test]
    fn test_moment_serialization_skips_cluster_fields() {
        let moment = Moment {
            start: 12.0,
            end: 19.0,
            reason: "Top lexical match".to_string(),
            emotion: Emotion::Funny,
            confidence: 0.8,
            comment: "lol".to_string(),
            likes: 3,
            title: "A joke".to_string(),
            score: 0.7,
            cluster_size: None,
            total_likes: None,
            sample_comments: Vec::new(),
            anchor_author: None,
            anchor_likes: None,
        };
        let json = serde_json::to_value(&moment).unwrap();
        assert_eq!(json["emotion"], "funny");
        assert!(json.get("clusterSize").is_none());

        let back: Moment = serde_json::from_value(json).unwrap();
        assert_eq!(back, moment);
    }
}
