//! Short-lived cache of computed moments, keyed by video.

mod memory;
mod sqlite;

pub use memory::MemoryMomentCache;
pub use sqlite::SqliteMomentCache;

use crate::moments::Moment;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default time-to-live of a cache entry.
pub const DEFAULT_TTL_HOURS: i64 = 6;

/// Storage key for a video's moments.
pub fn cache_key(video_id: &str) -> String {
    format!("moments:{}", video_id)
}

/// A cached moment list and when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub saved_at: DateTime<Utc>,
    pub data: Vec<Moment>,
}

impl CacheEntry {
    pub fn new(data: Vec<Moment>) -> Self {
        Self {
            saved_at: Utc::now(),
            data,
        }
    }

    /// Whether the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.saved_at) < ttl
    }
}

/// Cross-run moment cache.
///
/// Reads happen before a run and writes after it. Failures are logged by
/// implementations and surface as misses; they never abort a run.
#[async_trait]
pub trait MomentCache: Send + Sync {
    /// Fresh, non-empty cached moments for a video.
    async fn load(&self, video_id: &str) -> Option<Vec<Moment>>;

    async fn save(&self, video_id: &str, moments: &[Moment]);
}

/// Cache that never stores anything.
pub struct NoCache;

#[async_trait]
impl MomentCache for NoCache {
    async fn load(&self, _video_id: &str) -> Option<Vec<Moment>> {
        None
    }

    async fn save(&self, _video_id: &str, _moments: &[Moment]) {}
}
