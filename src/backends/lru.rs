use crate::cache::{CacheUnderTest, Metrics};
use crate::error::BackendError;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

const NAME: &str = "LRU";

struct Inner {
    cache: LruCache<String, Bytes>,
    stats: Metrics,
}

/// `lru::LruCache`，淘汰数来自 `push` 的返回值
pub struct LruBackend {
    inner: Mutex<Inner>,
}

impl LruBackend {
    pub fn new(capacity: usize) -> Result<Self, BackendError> {
        let capacity =
            NonZeroUsize::new(capacity).ok_or_else(|| BackendError::init(NAME, "capacity must be non-zero"))?;
        Ok(Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(capacity),
                stats: Metrics::default(),
            }),
        })
    }
}

impl CacheUnderTest for LruBackend {
    fn set(&self, key: &str, value: Bytes, _cost: i64) -> Result<bool, BackendError> {
        let mut inner = self.inner.lock();
        // 同 key 更新时 push 返回旧值，其余情况返回被淘汰的条目
        if let Some((old, _)) = inner.cache.push(key.to_owned(), value) {
            if old != key {
                inner.stats.evictions += 1;
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let cache = LruBackend::new(2).unwrap();
        let v = Bytes::from_static(b"x");
        cache.set("a", v.clone(), 1).unwrap();
        cache.set("b", v.clone(), 1).unwrap();
        cache.get("a").unwrap();
        cache.set("b", v.clone(), 1).unwrap();
        cache.set("c", v.clone(), 1).unwrap();

        assert!(cache.get("a").unwrap().is_none());
        assert!(cache.get("b").unwrap().is_some());
        assert_eq!(cache.metrics().evictions, 1);
    }
}
