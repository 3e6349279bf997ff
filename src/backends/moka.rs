use crate::cache::{CacheUnderTest, Metrics};
use crate::error::BackendError;
use bytes::Bytes;
use mini_moka::sync::Cache as MokaCache;
use std::sync::atomic::{AtomicU64, Ordering};

const NAME: &str = "Mini-Moka Sync";

/// `mini_moka::sync::Cache`，按字节加权
///
/// 无法观测淘汰数，evictions 始终为 0。
pub struct MokaBackend {
    cache: MokaCache<String, Bytes>,
    capacity_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MokaBackend {
    pub fn new(capacity_bytes: u64) -> Result<Self, BackendError> {
        if capacity_bytes == 0 {
            return Err(BackendError::init(NAME, "capacity must be non-zero"));
        }
        Ok(Self {
            cache: weighted_cache(capacity_bytes),
            capacity_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }
}

fn weighted_cache(capacity_bytes: u64) -> MokaCache<String, Bytes> {
    MokaCache::builder()
        // 权重为 key + value 的字节数
        .weigher(|key: &String, value: &Bytes| -> u32 {
            (key.len() + value.len()).try_into().unwrap_or(u32::MAX)
        })
        .max_capacity(capacity_bytes)
        .build()
}

impl CacheUnderTest for MokaBackend {
    fn set(&self, key: &str, value: Bytes, _cost: i64) -> Result<bool, BackendError> {
        self.cache.insert(key.to_owned(), value);
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let found = self.cache.get(&key.to_owned());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: 0,
        }
    }

    fn name(&self) -> &str {
        NAME
    }

    fn close(&mut self) -> Result<(), BackendError> {
        // invalidate_all 是惰性的，直接换一个空缓存，旧的随之释放
        self.cache = weighted_cache(self.capacity_bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_hits_and_misses() {
        let cache = MokaBackend::new(1 << 20).unwrap();
        cache.get("a").unwrap();
        cache.set("a", Bytes::from_static(b"v"), 1).unwrap();
        cache.get("a").unwrap();
        assert_eq!(
            cache.metrics(),
            Metrics {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }
}
