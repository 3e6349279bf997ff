//! 后端适配器
//! 每个适配器都是对具体缓存库的薄封装，可被多个 worker 并发调用

mod hashlink;
mod lru;
mod moka;
mod unbounded;

pub use self::hashlink::HashlinkBackend;
pub use self::lru::LruBackend;
pub use self::moka::MokaBackend;
pub use self::unbounded::UnboundedBackend;

use crate::cache::CacheUnderTest;
use crate::config::Scenario;
use crate::error::BackendError;

/// 可选的后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    Hashlink,
    Lru,
    MiniMoka,
    Unbounded,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Hashlink,
        BackendKind::Lru,
        BackendKind::MiniMoka,
        BackendKind::Unbounded,
    ];

    /// 按场景预算构造后端
    ///
    /// 条目计数型后端的容量为 `capacity_bytes / value_size`。
    pub fn build(&self, scenario: &Scenario) -> Result<Box<dyn CacheUnderTest>, BackendError> {
        Ok(match self {
            BackendKind::Hashlink => Box::new(HashlinkBackend::new(scenario.capacity_entries())?),
            BackendKind::Lru => Box::new(LruBackend::new(scenario.capacity_entries())?),
            BackendKind::MiniMoka => Box::new(MokaBackend::new(scenario.capacity_bytes)?),
            BackendKind::Unbounded => Box::new(UnboundedBackend::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadConfig;
    use bytes::Bytes;

    fn scenario(capacity_bytes: u64) -> Scenario {
        Scenario::new("t", WorkloadConfig::new(1, 100, 100, 8, 0.9), capacity_bytes)
    }

    #[test]
    fn every_backend_roundtrips_a_value() {
        for kind in BackendKind::ALL {
            let mut cache = kind.build(&scenario(1 << 20)).unwrap();
            let value = Bytes::from_static(b"payload!");
            assert_eq!(cache.get("key_1").unwrap(), None, "{}", cache.name());
            assert!(cache.set("key_1", value.clone(), value.len() as i64).unwrap());
            assert_eq!(cache.get("key_1").unwrap(), Some(value), "{}", cache.name());
            cache.close().unwrap();
            assert_eq!(cache.get("key_1").unwrap(), None, "{}", cache.name());
            cache.close().unwrap();
        }
    }

    #[test]
    fn names_are_distinct() {
        let names: Vec<String> = BackendKind::ALL
            .iter()
            .map(|k| k.build(&scenario(1 << 20)).unwrap().name().to_string())
            .collect();
        let mut dedup = names.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), names.len());
    }
}
