//! In-memory TTL response store.
//!
//! # Responsibilities
//! - Store successful GET responses until they expire
//! - Evict on read when expired
//! - Bound the number of entries: sweep expired first, then oldest-created
//!
//! Mechanism only; what gets cached is decided by the dispatcher.

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::http::response::Response;

/// A cached response. Replaced wholesale on refresh, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub body: Bytes,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn to_response(&self) -> Response {
        Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Thread-safe TTL cache keyed by [`cache_key`](super::key::cache_key).
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_size: usize,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(max_size: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
            clock,
        }
    }

    /// Live entry for `key`; an expired entry is removed and reported absent.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("response cache mutex poisoned");
        let expired = now >= entries.get(key)?.expires_at;
        if expired {
            entries.remove(key);
            tracing::trace!(key = %key, "Cache entry expired");
            return None;
        }
        entries.get(key).cloned()
    }

    /// Insert or replace the entry for `key`, valid for `ttl`.
    pub fn put(&self, key: &str, response: &Response, ttl: Duration) {
        if self.max_size == 0 {
            return;
        }
        let now = self.clock.now();
        let entry = CacheEntry {
            key: key.to_string(),
            body: response.body.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut entries = self.entries.lock().expect("response cache mutex poisoned");
        if !entries.contains_key(key) && entries.len() >= self.max_size {
            entries.retain(|_, e| now < e.expires_at);

            while entries.len() >= self.max_size {
                let oldest = entries
                    .values()
                    .min_by_key(|e| e.created_at)
                    .map(|e| e.key.clone());
                match oldest {
                    Some(oldest) => {
                        tracing::trace!(key = %oldest, "Evicting oldest cache entry");
                        entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        entries.insert(entry.key.clone(), entry);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("response cache mutex poisoned").clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("response cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(100, Arc::new(SystemClock))
    }
}
