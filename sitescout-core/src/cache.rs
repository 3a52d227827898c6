// TTL caches for resolved page sets

use crate::model::ScoredPage;
use crate::scoring::normalize_company_name;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Composite key of a normalized domain and a normalized company name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: String,
    pub company: String,
}

impl CacheKey {
    pub fn new(domain: &str, company_name: &str) -> Self {
        Self {
            domain: domain.trim().to_lowercase(),
            company: normalize_company_name(company_name),
        }
    }

    pub fn as_string(&self) -> String {
        format!("{}|{}", self.domain, self.company)
    }
}

/// Cached value: the full ranked page set of one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPages {
    pub pages: Vec<ScoredPage>,
    pub total_found: usize,
    pub subdomains_checked: usize,
    pub sitemaps_found: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: CachedPages,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Store for resolved page sets.
///
/// `get` treats an expired entry exactly like a missing one. `put` always
/// overwrites.
pub trait PageCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;
    fn put(&self, key: &CacheKey, value: CachedPages, ttl: Duration) -> Result<()>;
    /// Remove every entry, returning how many were removed
    fn clear(&self) -> Result<usize>;
    /// Number of live entries
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-process cache
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
            match entries.get(key) {
                Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    fn put(&self, key: &CacheKey, value: CachedPages, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.retain(|_, entry| !entry.is_expired_at(now));
        entries.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at: expiry_from(now, ttl),
            },
        );
        Ok(())
    }

    /// Drop everything; the count covers live entries only, as `len` does
    fn clear(&self) -> Result<usize> {
        let now = Utc::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        let removed = entries.values().filter(|e| !e.is_expired_at(now)).count();
        entries.clear();
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        let now = Utc::now();
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.values().filter(|e| !e.is_expired_at(now)).count())
    }
}

/// Persistent cache in a single SQLite table
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let cache = SqliteCache {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS page_cache (
                cache_key TEXT PRIMARY KEY,
                domain TEXT NOT NULL,
                company TEXT NOT NULL,
                payload TEXT NOT NULL,  -- JSON CachedPages
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_page_cache_domain ON page_cache(domain);
            CREATE INDEX IF NOT EXISTS idx_page_cache_expires ON page_cache(expires_at);
            ",
        )?;
        Ok(())
    }

    /// Delete expired rows, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let removed = conn.execute(
            "DELETE FROM page_cache WHERE expires_at <= ?1",
            params![Utc::now().timestamp_millis()],
        )?;
        Ok(removed)
    }
}

impl PageCache for SqliteCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, expires_at FROM page_cache WHERE cache_key = ?1",
                params![key.as_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_at).unwrap_or(now);
        if now >= expires_at {
            debug!("Cache entry for {} expired", key.as_string());
            conn.execute(
                "DELETE FROM page_cache WHERE cache_key = ?1",
                params![key.as_string()],
            )?;
            return Ok(None);
        }

        let value: CachedPages = serde_json::from_str(&payload)?;
        Ok(Some(CacheEntry { value, expires_at }))
    }

    fn put(&self, key: &CacheKey, value: CachedPages, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let payload = serde_json::to_string(&value)?;
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO page_cache (cache_key, domain, company, payload, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key.as_string(),
                &key.domain,
                &key.company,
                payload,
                now.timestamp_millis(),
                expiry_from(now, ttl).timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let live: i64 = conn.query_row(
            "SELECT COUNT(*) FROM page_cache WHERE expires_at > ?1",
            params![Utc::now().timestamp_millis()],
            |row| row.get(0),
        )?;
        conn.execute("DELETE FROM page_cache", [])?;
        Ok(live as usize)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM page_cache WHERE expires_at > ?1",
            params![Utc::now().timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
