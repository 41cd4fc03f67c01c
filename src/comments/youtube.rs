//! YouTube Data API comment listing.

use super::{Comment, CommentSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const COMMENT_THREADS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/commentThreads";

/// Page size requested from the API; only the first page is read.
pub const MAX_RESULTS: u32 = 50;

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(default)]
    items: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
struct Thread {
    #[serde(default)]
    id: String,
    snippet: Option<ThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    text_original: String,
    #[serde(default)]
    like_count: u64,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    author_display_name: String,
}

impl ThreadList {
    fn into_comments(self) -> Vec<Comment> {
        self.items
            .into_iter()
            .filter_map(|thread| {
                let snippet = thread.snippet?.top_level_comment?.snippet?;
                let text = if snippet.text_display.is_empty() {
                    snippet.text_original
                } else {
                    snippet.text_display
                };
                Some(Comment {
                    id: thread.id,
                    text,
                    likes: snippet.like_count,
                    published_at: snippet.published_at,
                    author: snippet.author_display_name,
                })
            })
            .collect()
    }
}

/// Relevance-ordered top-level comments from the Data API.
pub struct YoutubeCommentSource {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl YoutubeCommentSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: COMMENT_THREADS_ENDPOINT.to_string(),
        }
    }

    /// Point at a different endpoint, e.g. a local mirror.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, video_id: &str) -> Option<url::Url> {
        let mut url = url::Url::parse(&self.endpoint).ok()?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("order", "relevance")
            .append_pair("textFormat", "plainText")
            .append_pair("videoId", video_id)
            .append_pair("maxResults", &MAX_RESULTS.to_string())
            .append_pair("key", &self.api_key);
        Some(url)
    }
}

#[async_trait]
impl CommentSource for YoutubeCommentSource {
    #[instrument(skip(self))]
    async fn fetch_top_comments(&self, video_id: &str) -> Vec<Comment> {
        if self.api_key.is_empty() {
            return Vec::new();
        }
        let Some(url) = self.request_url(video_id) else {
            warn!("Invalid comment endpoint: {}", self.endpoint);
            return Vec::new();
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Comment request failed: {}", e);
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            warn!("Comment request returned {}", response.status());
            return Vec::new();
        }

        match response.json::<ThreadList>().await {
            Ok(list) => {
                let comments = list.into_comments();
                debug!("Fetched {} comments for {}", comments.len(), video_id);
                comments
            }
            Err(e) => {
                warn!("Failed to decode comments: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_list_mapping() {
        let json = r#"{
            "kind": "youtube#commentThreadListResponse",
            "items": [
                {"id": "c1", "snippet": {"topLevelComment": {"snippet": {
                    "textDisplay": "2:15 made me cry", "textOriginal": "orig",
                    "likeCount": 120, "publishedAt": "2024-03-01T12:00:00Z",
                    "authorDisplayName": "@viewer"}}}},
                {"id": "c2", "snippet": {"topLevelComment": {"snippet": {
                    "textOriginal": "only original"}}}},
                {"id": "c3", "snippet": {}}
            ]
        }"#;
        let comments = serde_json::from_str::<ThreadList>(json).unwrap().into_comments();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "2:15 made me cry");
        assert_eq!(comments[0].likes, 120);
        assert_eq!(comments[0].author, "@viewer");
        assert!(comments[0].published_at.is_some());
        assert_eq!(comments[1].text, "only original");
        assert_eq!(comments[1].likes, 0);
    }

    #[test]
    fn test_request_url() {
        let source = YoutubeCommentSource::new("KEY");
        let url = source.request_url("abc").unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(query.contains(&("order".to_string(), "relevance".to_string())));
        assert!(query.contains(&("maxResults".to_string(), "50".to_string())));
        assert!(query.contains(&("videoId".to_string(), "abc".to_string())));
        assert!(query.contains(&("key".to_string(), "KEY".to_string())));
    }

    #[tokio::test]
    async fn test_missing_key_is_empty() {
        let source = YoutubeCommentSource::new("");
        assert!(source.fetch_top_comments("abc").await.is_empty());
    }
}
