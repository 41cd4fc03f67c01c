//! SQLite-backed moment cache.

use super::{cache_key, CacheEntry, MomentCache};
use crate::error::{MomentsError, Result};
use crate::moments::Moment;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        saved_at TEXT NOT NULL,
        data TEXT NOT NULL
    );
"#;

/// Moment cache persisted in a single SQLite table.
pub struct SqliteMomentCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteMomentCache {
    /// Open (or create) the cache database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, ttl: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened moment cache at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
        })
    }

    /// In-memory database, for tests and one-off runs.
    pub fn in_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MomentsError::Cache(format!("Lock poisoned: {}", e)))
    }

    /// Read the raw entry for a video regardless of age.
    pub fn get_entry(&self, video_id: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT saved_at, data FROM cache WHERE key = ?1",
                params![cache_key(video_id)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((saved_at, data)) = row else {
            return Ok(None);
        };
        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .map_err(|e| MomentsError::Cache(format!("Bad timestamp: {}", e)))?
            .with_timezone(&Utc);
        let data: Vec<Moment> = serde_json::from_str(&data)?;
        Ok(Some(CacheEntry { saved_at, data }))
    }

    /// Write an entry, replacing any previous one for the video.
    pub fn put_entry(&self, video_id: &str, entry: &CacheEntry) -> Result<()> {
        let data = serde_json::to_string(&entry.data)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache (key, saved_at, data) VALUES (?1, ?2, ?3)",
            params![cache_key(video_id), entry.saved_at.to_rfc3339(), data],
        )?;
        Ok(())
    }

    /// Delete entries older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.ttl;
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, saved_at FROM cache")?;
        let expired: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .filter_map(|r| r.ok())
            .filter(|(_, saved_at)| {
                DateTime::parse_from_rfc3339(saved_at)
                    .map(|t| t.with_timezone(&Utc) <= cutoff)
                    .unwrap_or(true)
            })
            .map(|(key, _)| key)
            .collect();
        drop(stmt);

        for key in &expired {
            conn.execute("DELETE FROM cache WHERE key = ?1", params![key])?;
        }
        Ok(expired.len())
    }
}

#[async_trait]
impl MomentCache for SqliteMomentCache {
    async fn load(&self, video_id: &str) -> Option<Vec<Moment>> {
        match self.get_entry(video_id) {
            Ok(Some(entry)) if entry.is_fresh(self.ttl, Utc::now()) && !entry.data.is_empty() => {
                debug!("Cache hit for {}", video_id);
                Some(entry.data)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", video_id, e);
                None
            }
        }
    }

    async fn save(&self, video_id: &str, moments: &[Moment]) {
        if let Err(e) = self.put_entry(video_id, &CacheEntry::new(moments.to_vec())) {
            warn!("Cache write failed for {}: {}", video_id, e);
        }
    }
}
