//! Viewer comments and where they come from.

mod timestamps;
mod youtube;

pub use timestamps::{extract_mentions, most_frequent_mention};
pub use youtube::{YoutubeCommentSource, COMMENT_THREADS_ENDPOINT, MAX_RESULTS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level viewer comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: String,
}

impl Comment {
    pub fn new(id: impl Into<String>, text: impl Into<String>, likes: u64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            likes,
            published_at: None,
            author: String::new(),
        }
    }
}

/// Supplies the most relevant comments for a video.
///
/// Implementations degrade to an empty list instead of failing; the caller
/// reports "no comments" rather than an error.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_top_comments(&self, video_id: &str) -> Vec<Comment>;
}

/// Fixed comments, used when comments were exported ahead of time.
pub struct StaticComments(pub Vec<Comment>);

#[async_trait]
impl CommentSource for StaticComments {
    async fn fetch_top_comments(&self, _video_id: &str) -> Vec<Comment> {
        self.0.clone()
    }
}
