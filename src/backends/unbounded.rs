use crate::cache::{CacheUnderTest, Metrics};
use crate::error::BackendError;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

const NAME: &str = "Unbounded";

/// 不限容量的哈希表，从不淘汰，自带命中计数
#[derive(Default)]
pub struct UnboundedBackend {
    map: RwLock<HashMap<String, Bytes>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl UnboundedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl CacheUnderTest for UnboundedBackend {
    fn set(&self, key: &str, value: Bytes, _cost: i64) -> Result<bool, BackendError> {
        self.map.write().insert(key.to_owned(), value);
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let found = self.map.read().get(key).cloned();
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
        self.map.get_mut().clear();
        Ok(())
    }
}
