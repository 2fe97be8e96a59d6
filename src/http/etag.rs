use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Entity tags keyed by resource identity (the full request URL).
///
/// Bounded LRU so a long-running poller cannot grow it without limit.
/// One cache may be shared by several [`ConditionalFetchClient`]s via `Arc`,
/// which lets distinct resources be polled concurrently without dedicating a
/// client instance to each.
///
/// [`ConditionalFetchClient`]: super::ConditionalFetchClient
pub struct EtagCache {
    entries: Mutex<LruCache<String, String>>,
}

impl EtagCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a cache holding at most `capacity` tags (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, resource: &str) -> Option<String> {
        self.lock().get(resource).cloned()
    }

    pub fn insert(&self, resource: &str, etag: &str) {
        self.lock().put(resource.to_owned(), etag.to_owned());
    }

    pub fn remove(&self, resource: &str) -> Option<String> {
        self.lock().pop(resource)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock leaves the map intact, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EtagCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EtagCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtagCache")
            .field("len", &self.len())
            .finish()
    }
}
