//! In-process moment cache.

use super::{cache_key, CacheEntry, MomentCache};
use crate::moments::Moment;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Moment cache held in memory for the lifetime of the process.
pub struct MemoryMomentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryMomentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Store an entry as-is, keeping its timestamp.
    pub fn insert_entry(&self, video_id: &str, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(cache_key(video_id), entry);
        }
    }
}

#[async_trait]
impl MomentCache for MemoryMomentCache {
    async fn load(&self, video_id: &str) -> Option<Vec<Moment>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&cache_key(video_id))?;
        (entry.is_fresh(self.ttl, Utc::now()) && !entry.data.is_empty()).then(|| entry.data.clone())
    }

    async fn save(&self, video_id: &str, moments: &[Moment]) {
        self.insert_entry(video_id, CacheEntry::new(moments.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::Emotion;

    fn moment() -> Moment {
        Moment {
            start: 3.0,
            end: 10.0,
            reason: String::new(),
            emotion: Emotion::Sad,
            confidence: 0.4,
            comment: "oof".to_string(),
            likes: 2,
            title: "Oof".to_string(),
            score: 0.3,
            cluster_size: None,
            total_likes: None,
            sample_comments: Vec::new(),
            anchor_author: None,
            anchor_likes: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let cache = MemoryMomentCache::new(Duration::hours(6));
        assert!(cache.load("v").await.is_none());

        cache.save("v", &[moment()]).await;
        assert_eq!(cache.load("v").await.unwrap(), vec![moment()]);
        assert!(cache.load("other").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_and_empty_entries_miss() {
        let cache = MemoryMomentCache::new(Duration::hours(6));
        let mut old = CacheEntry::new(vec![moment()]);
        old.saved_at = Utc::now() - Duration::hours(7);
        cache.insert_entry("v", old);
        assert!(cache.load("v").await.is_none());

        cache.save("e", &[]).await;
        assert!(cache.load("e").await.is_none());
    }
}
