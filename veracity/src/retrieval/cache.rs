use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Thread-safe LRU cache of ranked evidence, keyed by normalised question.
#[derive(Clone)]
pub struct EvidenceCache {
    cache: Arc<Mutex<LruCache<String, Vec<String>>>>,
}

impl EvidenceCache {
    /// `None` when `capacity` is zero, which disables caching.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        })
    }

    pub fn get(&self, question: &str) -> Option<Vec<String>> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(&Self::key(question)).cloned()
    }

    pub fn put(&self, question: &str, evidence: Vec<String>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(Self::key(question), evidence);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(question: &str) -> String {
        question.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }
}
