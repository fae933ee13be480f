//! Storage for rendered pages.

use std::{sync::RwLock, time::Duration};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("page cache backend unavailable: {0}")]
    Unavailable(String),
}

/// A rendered response, stored byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

/// Key/value store with per-entry expiry.
///
/// Entries past their TTL are never returned.
pub trait PageStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CachedPage>, CacheError>;

    fn set(&self, key: String, page: CachedPage, ttl: Duration) -> Result<(), CacheError>;
}

struct Entry {
    page: CachedPage,
    expires_at: Instant,
}

/// In-process LRU store bounded by `cache.max_entries`.
pub struct MemoryPageStore {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryPageStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, "page_store_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageStore for MemoryPageStore {
    fn get(&self, key: &str) -> Result<Option<CachedPage>, CacheError> {
        let mut entries = rw_write(&self.entries, "page_store_get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.page.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    fn set(&self, key: String, page: CachedPage, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            page,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, "page_store_set").put(key, entry);
        Ok(())
    }
}
