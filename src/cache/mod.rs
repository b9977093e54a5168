//! Rendered page cache
//!
//! Pages generated for published content are kept for the revalidation
//! interval and regenerated on the first request after they expire. Preview
//! renders never enter the cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A rendered page and when it was produced
#[derive(Debug, Clone)]
struct CacheEntry {
    rendered_at: Instant,
    html: String,
}

/// Route path -> rendered HTML, valid for `ttl`
#[derive(Debug)]
pub struct PageCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Revalidation interval in seconds
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// The cached page for `path`, if still fresh
    pub async fn get(&self, path: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(path)?;
        if entry.rendered_at.elapsed() < self.ttl {
            Some(entry.html.clone())
        } else {
            tracing::debug!("Cached page expired: {}", path);
            None
        }
    }

    pub async fn insert(&self, path: &str, html: String) {
        self.entries.write().await.insert(
            path.to_string(),
            CacheEntry {
                rendered_at: Instant::now(),
                html,
            },
        );
    }

    pub async fn invalidate(&self, path: &str) {
        self.entries.write().await.remove(path);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
