//! 工作负载模块
//! 由配置确定性地生成操作序列和共享 value

use crate::config::{KEY_PREFIX, WorkloadConfig};
use crate::error::Result;
use crate::sampler::SkewSampler;
use bytes::Bytes;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write;

/// 单次访问意图，只保存 key 编号
///
/// 外部 key 字符串在回放时才生成，内存随 N 增长而不随操作数增长。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Operation {
    pub key_id: u64,
}

impl Operation {
    /// 把外部 key 写进复用的缓冲区
    #[inline]
    pub fn write_key(&self, buf: &mut String) {
        buf.clear();
        buf.push_str(KEY_PREFIX);
        // 写入 String 不会失败
        let _ = write!(buf, "{}", self.key_id);
    }
}

/// 生成外部 key，形如 `key_42`
pub fn key_for(id: u64) -> String {
    let mut buf = String::with_capacity(KEY_PREFIX.len() + 20);
    Operation { key_id: id }.write_key(&mut buf);
    buf
}

/// 只读的操作序列 + 共享 value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    operations: Vec<Operation>,
    shared_value: Bytes,
    key_space_size: u64,
}

impl Workload {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// 所有 set 共用的 value
    pub fn shared_value(&self) -> &Bytes {
        &self.shared_value
    }

    pub fn key_space_size(&self) -> u64 {
        self.key_space_size
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// 工作负载生成器
pub struct WorkloadBuilder;

impl WorkloadBuilder {
    /// 用 `config.seed` 播种并生成工作负载
    pub fn build(config: &WorkloadConfig) -> Result<Workload> {
        Self::build_with_rng(config, ChaCha8Rng::seed_from_u64(config.seed))
    }

    /// 使用调用方提供的随机源生成，先填充 value，再抽取 key 编号
    pub fn build_with_rng<R: Rng>(config: &WorkloadConfig, mut rng: R) -> Result<Workload> {
        config.validate()?;

        let mut value = vec![0u8; config.value_size];
        rng.fill_bytes(&mut value);

        let mut sampler = SkewSampler::new(rng, config.key_space_size, config.skew, config.method)?;

        let mut operations = Vec::with_capacity(config.total_ops);
        for _ in 0..config.total_ops {
            operations.push(Operation {
                key_id: sampler.next_id(),
            });
        }

        Ok(Workload {
            operations,
            shared_value: Bytes::from(value),
            key_space_size: config.key_space_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ZipfMethod;

    fn config() -> WorkloadConfig {
        WorkloadConfig::new(42, 1000, 10_000, 64, 0.99)
    }

    #[test]
    fn build_is_deterministic() {
        for method in [ZipfMethod::Approximate, ZipfMethod::Exact] {
            let cfg = config().with_method(method);
            let a = WorkloadBuilder::build(&cfg).unwrap();
            let b = WorkloadBuilder::build(&cfg).unwrap();
            assert_eq!(a.operations(), b.operations());
            assert_eq!(a.shared_value(), b.shared_value());
        }
    }

    #[test]
    fn length_and_range() {
        let w = WorkloadBuilder::build(&config()).unwrap();
        assert_eq!(w.len(), 10_000);
        assert_eq!(w.shared_value().len(), 64);
        assert!(w.operations().iter().all(|op| op.key_id < 1000));
    }

    #[test]
    fn seed_changes_value() {
        let a = WorkloadBuilder::build(&config()).unwrap();
        let b = WorkloadBuilder::build(&WorkloadConfig { seed: 43, ..config() }).unwrap();
        assert_ne!(a.shared_value(), b.shared_value());
    }

    #[test]
    fn zero_ops_is_empty() {
        let w = WorkloadBuilder::build(&WorkloadConfig { total_ops: 0, ..config() }).unwrap();
        assert!(w.is_empty());
        assert_eq!(w.shared_value().len(), 64);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(WorkloadBuilder::build(&WorkloadConfig { key_space_size: 0, ..config() }).is_err());
    }

    #[test]
    fn keys_are_formatted_lazily() {
        let mut buf = String::from("stale");
        Operation { key_id: 7 }.write_key(&mut buf);
        assert_eq!(buf, "key_7");
        assert_eq!(key_for(123_456), "key_123456");
        assert_eq!(std::mem::size_of::<Operation>(), std::mem::size_of::<u64>());
    }
}
