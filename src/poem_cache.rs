use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::generate::GenerateError;

#[derive(Clone)]
struct CachedPoem {
    text: String,
    created_at: Instant,
}

/// Cache of generated poems keyed by the `{place}|{time}|{date}`
/// fingerprint.
///
/// Entries expire lazily after the configured TTL. Concurrent requests for
/// the same key are serialized through a per-key lock so at most one
/// generation runs per key; only successful generations are stored.
pub struct PoemCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPoem>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Builds the composite fingerprint addressing the cache.
pub fn fingerprint(place: &str, time: &str, date: &str) -> String {
    format!("{place}|{time}|{date}")
}

impl PoemCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached poem for `key` if present and still fresh.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.text.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `text` for `key`, unconditionally overwriting.
    pub async fn put(&self, key: &str, text: String) {
        self.entries.lock().await.insert(
            key.to_string(),
            CachedPoem {
                text,
                created_at: Instant::now(),
            },
        );
    }

    /// Returns the cached poem for `key`, or runs `generate` and stores its
    /// result.
    ///
    /// Single flight: concurrent callers with the same key await the first
    /// caller's in-progress generation instead of issuing their own. Errors
    /// propagate to the caller and leave nothing cached.
    pub async fn get_or_generate<F, Fut>(&self, key: &str, generate: F) -> Result<String, GenerateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, GenerateError>>,
    {
        if let Some(text) = self.get(key).await {
            return Ok(text);
        }
        let guard = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _held = guard.lock().await;
        // A concurrent request may have filled the entry while we waited.
        if let Some(text) = self.get(key).await {
            return Ok(text);
        }
        let result = generate().await;
        if let Ok(text) = &result {
            self.put(key, text.clone()).await;
        }
        self.inflight.lock().await.remove(key);
        result
    }
}
