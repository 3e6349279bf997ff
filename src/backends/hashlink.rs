use crate::cache::{CacheUnderTest, Metrics};
use crate::error::BackendError;
use bytes::Bytes;
use hashlink::LruCache as HashlinkLruCache;
use parking_lot::Mutex;

const NAME: &str = "Hashlink LRU";

struct Inner {
    cache: HashlinkLruCache<String, Bytes>,
    stats: Metrics,
}

/// `hashlink::LruCache`，按条目计数
pub struct HashlinkBackend {
    inner: Mutex<Inner>,
}

impl HashlinkBackend {
    pub fn new(capacity: usize) -> Result<Self, BackendError> {
        if capacity == 0 {
            return Err(BackendError::init(NAME, "capacity must be non-zero"));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                cache: HashlinkLruCache::new(capacity),
                stats: Metrics::default(),
            }),
        })
    }
}

impl CacheUnderTest for HashlinkBackend {
    fn set(&self, key: &str, value: Bytes, _cost: i64) -> Result<bool, BackendError> {
        let mut inner = self.inner.lock();
        if !inner.cache.contains_key(key) && inner.cache.len() >= inner.cache.capacity() {
            inner.stats.evictions += 1;
        }
        inner.cache.insert(key.to_owned(), value);
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let mut inner = self.inner.lock();
        let found = inner.cache.get(key).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        Ok(found)
    }

    fn metrics(&self) -> Metrics {
        self.inner.lock().stats
    }

    fn name(&self) -> &str {
        NAME
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.inner.get_mut().cache.clear();
        Ok(())
    }
}
