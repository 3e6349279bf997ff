//! 配置模块
//! 定义所有应用级别的常量和配置

use crate::error::{AppError, Result};
use crate::percentile::RankRule;
use crate::sampler::ZipfMethod;
use std::num::NonZeroUsize;

/// 默认并发 worker 数量
pub const DEFAULT_WORKERS: usize = 4;

/// 基准 value 大小（字节）
pub const BASE_VALUE_SIZE: usize = 1024;

/// 默认工作负载种子
pub const DEFAULT_SEED: u64 = 42;

/// 外部 key 前缀，key 形如 `key_123`
pub const KEY_PREFIX: &str = "key_";

/// 默认结果目录
pub const RESULTS_DIR: &str = "results";

const MB: u64 = 1 << 20;

/// 工作负载配置，完全决定一个 Workload
#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadConfig {
    pub seed: u64,
    pub key_space_size: u64,
    pub total_ops: usize,
    pub value_size: usize,
    pub skew: f64,
    pub method: ZipfMethod,
}

impl WorkloadConfig {
    pub fn new(seed: u64, key_space_size: u64, total_ops: usize, value_size: usize, skew: f64) -> Self {
        Self {
            seed,
            key_space_size,
            total_ops,
            value_size,
            skew,
            method: ZipfMethod::default(),
        }
    }

    pub fn with_method(mut self, method: ZipfMethod) -> Self {
        self.method = method;
        self
    }

    /// 校验配置，total_ops = 0 合法
    pub fn validate(&self) -> Result<()> {
        if self.key_space_size == 0 {
            return Err(AppError::Config("key_space_size must be positive".into()));
        }
        if self.value_size == 0 {
            return Err(AppError::Config("value_size must be positive".into()));
        }
        if !self.skew.is_finite() || self.skew < 0.0 {
            return Err(AppError::Config(format!(
                "skew must be a finite value >= 0, got {}",
                self.skew
            )));
        }
        Ok(())
    }
}

/// 操作序列切分策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ChunkPolicy {
    /// 余数平摊到前 `len % workers` 个 worker，全部操作都会执行
    #[default]
    Distribute,
    /// 整除截断，尾部余数被丢弃（历史行为）
    Truncate,
}

/// 命中/未命中计数的汇总方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HitAccounting {
    /// 只用引擎自己的计数
    #[default]
    Local,
    /// 只用后端自报的计数
    Backend,
    /// 两者相加（历史行为，后端自带统计时会重复计数）
    Sum,
}

/// 后端 get/set 出错时的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorMode {
    /// get 出错视为未命中，set 出错忽略（历史行为）
    #[default]
    Coarse,
    /// 出错单独计为 error
    Strict,
}

/// 基准引擎配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub workers: NonZeroUsize,
    pub chunk_policy: ChunkPolicy,
    pub accounting: HitAccounting,
    pub error_mode: ErrorMode,
    pub rank_rule: RankRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
            chunk_policy: ChunkPolicy::default(),
            accounting: HitAccounting::default(),
            error_mode: ErrorMode::default(),
            rank_rule: RankRule::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        self.workers = NonZeroUsize::new(workers)
            .ok_or_else(|| AppError::Config("workers must be positive".into()))?;
        Ok(self)
    }

    pub fn with_chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.chunk_policy = policy;
        self
    }

    pub fn with_accounting(mut self, accounting: HitAccounting) -> Self {
        self.accounting = accounting;
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    pub fn with_rank_rule(mut self, rule: RankRule) -> Self {
        self.rank_rule = rule;
        self
    }
}

/// 一个测试场景：标签 + 工作负载 + 目标缓存预算
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub workload: WorkloadConfig,
    /// 缓存预算（字节），各后端自行解释
    pub capacity_bytes: u64,
}

impl Scenario {
    pub fn new(id: impl Into<String>, workload: WorkloadConfig, capacity_bytes: u64) -> Self {
        Self {
            id: id.into(),
            workload,
            capacity_bytes,
        }
    }

    /// 按条目计数的后端使用的容量，至少为 1
    pub fn capacity_entries(&self) -> usize {
        let per_entry = self.workload.value_size.max(1) as u64;
        (self.capacity_bytes / per_entry).max(1) as usize
    }
}

/// 预置场景
pub mod presets {
    use super::*;

    fn scaled(n: u64, scale: u64) -> u64 {
        (n / scale.max(1)).max(1)
    }

    /// 缓存大小扫描（命中率 vs 内存）
    pub fn cache_size_sweep(scale: u64) -> Vec<Scenario> {
        [
            ("size_64mb", 64 * MB),
            ("size_128mb", 128 * MB),
            ("size_256mb", 256 * MB),
            ("size_512mb", 512 * MB),
            ("size_1gb", 1024 * MB),
        ]
        .into_iter()
        .map(|(id, size)| {
            let workload = WorkloadConfig::new(
                DEFAULT_SEED,
                scaled(10_000_000, scale),
                scaled(20_000_000, scale) as usize,
                BASE_VALUE_SIZE,
                0.99,
            );
            Scenario::new(id, workload, scaled(size, scale))
        })
        .collect()
    }

    /// value 大小扫描（吞吐 vs 对象大小），固定 512MB
    pub fn value_size_sweep(scale: u64) -> Vec<Scenario> {
        [
            ("val_256b", 256),
            ("val_1kb", 1024),
            ("val_4kb", 4096),
            ("val_16kb", 16384),
            ("val_64kb", 65536),
        ]
        .into_iter()
        .map(|(id, value_size)| {
            let workload = WorkloadConfig::new(
                DEFAULT_SEED,
                scaled(1_000_000, scale),
                scaled(5_000_000, scale) as usize,
                value_size,
                0.95,
            );
            Scenario::new(id, workload, scaled(512 * MB, scale))
        })
        .collect()
    }

    /// skew 扫描（适应性分析），固定 256MB
    pub fn skew_sweep(scale: u64) -> Vec<Scenario> {
        [
            ("skew_0.80", 0.80),
            ("skew_0.90", 0.90),
            ("skew_0.95", 0.95),
            ("skew_0.99", 0.99),
        ]
        .into_iter()
        .map(|(id, skew)| {
            let workload = WorkloadConfig::new(
                DEFAULT_SEED,
                scaled(5_000_000, scale),
                scaled(10_000_000, scale) as usize,
                BASE_VALUE_SIZE,
                skew,
            );
            Scenario::new(id, workload, scaled(256 * MB, scale))
        })
        .collect()
    }

    pub fn all(scale: u64) -> Vec<Scenario> {
        let mut scenarios = cache_size_sweep(scale);
        scenarios.extend(value_size_sweep(scale));
        scenarios.extend(skew_sweep(scale));
        scenarios
    }
}

/// 基准测试配置
pub mod bench {
    /// 采样数量
    pub const SAMPLE_SIZE: usize = 20;

    /// 测量时间（秒）
    pub const MEASUREMENT_TIME_SECS: u64 = 10;

    /// 工作负载种子
    pub const WORKLOAD_SEED: u64 = 42;

    /// key 空间大小
    pub const KEY_SPACE: u64 = 100_000;

    /// 每次测试的操作数量
    pub const OPS: usize = 200_000;

    /// Zipf分布参数
    pub const SKEW: f64 = 0.99;

    /// 缓存预算（字节）
    pub const CAPACITY_BYTES: u64 = 16 << 20;
}

/// 错误消息常量
pub mod messages {
    pub const WORKLOAD_GEN_FAILED: &str = "Failed to generate workload";
    pub const BACKEND_INIT_FAILED: &str = "Failed to construct backend";
    pub const BENCHMARK_FAILED: &str = "Benchmark run failed";
    pub const SINK_CREATE_FAILED: &str = "Failed to create result sink";
    pub const SINK_WRITE_FAILED: &str = "Failed to write results";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_values() {
        let ok = WorkloadConfig::new(1, 10, 0, 8, 0.0);
        assert!(ok.validate().is_ok());

        assert!(WorkloadConfig { key_space_size: 0, ..ok.clone() }.validate().is_err());
        assert!(WorkloadConfig { value_size: 0, ..ok.clone() }.validate().is_err());
        assert!(WorkloadConfig { skew: -0.1, ..ok.clone() }.validate().is_err());
        assert!(WorkloadConfig { skew: f64::NAN, ..ok }.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(EngineConfig::default().with_workers(0).is_err());
        assert_eq!(EngineConfig::default().workers.get(), DEFAULT_WORKERS);
    }

    #[test]
    fn capacity_entries_uses_value_size() {
        let s = Scenario::new("x", WorkloadConfig::new(1, 10, 10, 1024, 0.9), 64 * MB);
        assert_eq!(s.capacity_entries(), 65536);
        let tiny = Scenario::new("y", WorkloadConfig::new(1, 10, 10, 1024, 0.9), 10);
        assert_eq!(tiny.capacity_entries(), 1);
    }

    #[test]
    fn presets_match_sweeps() {
        let all = presets::all(1);
        assert_eq!(all.len(), 14);
        assert_eq!(all[0].id, "size_64mb");
        assert_eq!(all[0].workload.total_ops, 20_000_000);

        let small = presets::skew_sweep(1000);
        assert_eq!(small[3].workload.key_space_size, 5_000);
        assert_eq!(small[3].workload.total_ops, 10_000);
        assert!(small.iter().all(|s| s.workload.validate().is_ok()));
    }
}
