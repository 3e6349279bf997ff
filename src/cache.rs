//! 缓存抽象模块
//! 定义被测缓存的统一接口

use crate::error::BackendError;
use bytes::Bytes;
use std::ops::Deref;
use tracing::warn;

/// 后端自报的计数器，无法观测的字段为 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// 被测缓存 trait，统一接口
///
/// 实现必须能被多个 worker 并发调用，调用方不做额外同步。
pub trait CacheUnderTest: Send + Sync {
    /// 插入或更新，返回值表示是否被接受
    fn set(&self, key: &str, value: Bytes, cost: i64) -> Result<bool, BackendError>;

    /// 获取缓存值
    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    /// 构造以来的计数器
    fn metrics(&self) -> Metrics;

    /// 缓存名称（用于日志和结果）
    fn name(&self) -> &str;

    /// 释放全部资源
    fn close(&mut self) -> Result<(), BackendError>;
}

impl<C: CacheUnderTest + ?Sized> CacheUnderTest for Box<C> {
    #[inline]
    fn set(&self, key: &str, value: Bytes, cost: i64) -> Result<bool, BackendError> {
        (**self).set(key, value, cost)
    }

    #[inline]
    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        (**self).get(key)
    }

    fn metrics(&self) -> Metrics {
        (**self).metrics()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn close(&mut self) -> Result<(), BackendError> {
        (**self).close()
    }
}

/// 保证缓存被关闭的守卫
///
/// 显式 `close` 可拿到错误；没有显式关闭时在 drop 中关闭并记录告警。
pub struct CacheGuard<C: CacheUnderTest> {
    cache: C,
    closed: bool,
}

impl<C: CacheUnderTest> CacheGuard<C> {
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            closed: false,
        }
    }

    /// 关闭缓存，重复调用无效果
    pub fn close(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cache.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<C: CacheUnderTest> Deref for CacheGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.cache
    }
}

impl<C: CacheUnderTest> Drop for CacheGuard<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(cache = self.cache.name(), error = %e, "close failed");
        }
    }
}
