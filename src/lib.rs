//! 缓存基准测试库
//!
//! 生成可复现的偏斜访问序列，在多个缓存实现上并发回放，
//! 统计延迟分布、命中率、吞吐、淘汰数和内存占用。
//!
//! 特性：
//! - Zipf（或均匀）分布的确定性 key 采样
//! - 固定数量 worker 的并发回放，计数锁不跨越后端调用
//! - 最近秩百分位（p50/p95/p99）
//! - 可插拔的后端和结果输出

pub mod backends;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod memory;
pub mod percentile;
pub mod report;
pub mod sampler;
pub mod workload;

pub use cache::{CacheGuard, CacheUnderTest, Metrics};
pub use config::{ChunkPolicy, EngineConfig, ErrorMode, HitAccounting, Scenario, WorkloadConfig};
pub use engine::{BenchmarkEngine, BenchmarkResult};
pub use error::{AppError, BackendError, Result};
pub use percentile::{LatencyPercentiles, RankRule, percentile};
pub use sampler::{SkewSampler, ZipfMethod};
pub use workload::{Operation, Workload, WorkloadBuilder};
