//! 基准引擎模块
//! 用固定数量的 worker 回放工作负载，记录每次操作的延迟和命中情况

use crate::cache::CacheUnderTest;
use crate::config::{ChunkPolicy, EngineConfig, ErrorMode, HitAccounting};
use crate::error::{AppError, Result};
use crate::memory::{MemoryProbe, NoopProbe};
use crate::percentile::LatencyPercentiles;
use crate::workload::{Operation, Workload};
use bytes::Bytes;
use parking_lot::Mutex;
use std::any::Any;
use std::ops::Range;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// 单个 (配置, 后端) 的聚合结果
#[derive(Clone, Debug)]
pub struct BenchmarkResult {
    pub cache_name: String,
    /// 升序排列的单次操作延迟
    pub latencies: Vec<Duration>,
    pub hits: u64,
    pub misses: u64,
    /// 仅 `ErrorMode::Strict` 下非零
    pub errors: u64,
    /// 后端自报
    pub evictions: u64,
    pub requested_ops: usize,
    pub dispatched_ops: usize,
    /// worker 阶段的墙钟时间
    pub elapsed: Duration,
    pub memory_mb: f64,
    pub percentiles: LatencyPercentiles,
}

impl BenchmarkResult {
    /// 命中率，范围 [0, 1]
    #[inline]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// 每秒操作数
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.dispatched_ops as f64 / secs
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Hit,
    Miss,
    Error,
}

/// 所有 worker 共享的计数，只在追加时短暂加锁
#[derive(Default)]
struct Tally {
    hits: u64,
    misses: u64,
    errors: u64,
    latencies: Vec<Duration>,
}

impl Tally {
    #[inline]
    fn record(&mut self, outcome: Outcome, latency: Duration) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::Error => self.errors += 1,
        }
        self.latencies.push(latency);
    }
}

/// 把 `len` 个操作切成 `workers` 段连续区间
///
/// `Truncate` 丢弃 `len % workers` 个尾部操作；`Distribute` 让前几段各多一个。
pub fn partition(len: usize, workers: usize, policy: ChunkPolicy) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let extra = match policy {
        ChunkPolicy::Truncate => 0,
        ChunkPolicy::Distribute => len % workers,
    };

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// 基准引擎
pub struct BenchmarkEngine {
    config: EngineConfig,
    probe: Arc<dyn MemoryProbe>,
}

impl Default for BenchmarkEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl BenchmarkEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            probe: Arc::new(NoopProbe),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 回放工作负载并汇总结果
    pub fn run<C: CacheUnderTest + ?Sized>(&self, cache: &C, workload: &Workload) -> Result<BenchmarkResult> {
        let ops = workload.operations();
        let ranges = partition(ops.len(), self.config.workers.get(), self.config.chunk_policy);
        let dispatched: usize = ranges.iter().map(|r| r.len()).sum();
        debug!(
            cache = cache.name(),
            requested = ops.len(),
            dispatched,
            workers = ranges.len(),
            "partitioned workload"
        );

        // 预分配，避免测量中途扩容
        let shared = Mutex::new(Tally {
            latencies: Vec::with_capacity(dispatched),
            ..Tally::default()
        });
        let value = workload.shared_value();
        let mode = self.config.error_mode;

        let start = Instant::now();
        let joined = thread::scope(|s| -> Result<Vec<(usize, thread::Result<()>)>> {
            let shared = &shared;
            let mut handles = Vec::with_capacity(ranges.len());
            for (worker, range) in ranges.iter().cloned().enumerate() {
                if range.is_empty() {
                    continue;
                }
                let chunk = &ops[range];
                let handle = thread::Builder::new()
                    .name(format!("bench-worker-{}", worker))
                    .spawn_scoped(s, move || replay_chunk(cache, chunk, value, mode, shared))?;
                handles.push((worker, handle));
            }
            Ok(handles
                .into_iter()
                .map(|(worker, handle)| (worker, handle.join()))
                .collect())
        })?;
        let elapsed = start.elapsed();

        for (worker, outcome) in joined {
            if let Err(payload) = outcome {
                return Err(AppError::WorkerPanicked {
                    worker,
                    reason: panic_reason(payload.as_ref()),
                });
            }
        }

        let mut tally = shared.into_inner();
        let memory_mb = self.probe.resident_mb();
        tally.latencies.sort_unstable();

        let backend = cache.metrics();
        let (hits, misses) = match self.config.accounting {
            HitAccounting::Local => (tally.hits, tally.misses),
            HitAccounting::Backend => (backend.hits, backend.misses),
            HitAccounting::Sum => (tally.hits + backend.hits, tally.misses + backend.misses),
        };

        Ok(BenchmarkResult {
            cache_name: cache.name().to_string(),
            percentiles: LatencyPercentiles::from_sorted(&tally.latencies, self.config.rank_rule),
            latencies: tally.latencies,
            hits,
            misses,
            errors: tally.errors,
            evictions: backend.evictions,
            requested_ops: ops.len(),
            dispatched_ops: dispatched,
            elapsed,
            memory_mb,
        })
    }
}

/// 单个 worker：按顺序回放自己的区间，锁只包住计数追加
fn replay_chunk<C: CacheUnderTest + ?Sized>(
    cache: &C,
    chunk: &[Operation],
    value: &Bytes,
    mode: ErrorMode,
    shared: &Mutex<Tally>,
) {
    let cost = value.len() as i64;
    let mut key = String::with_capacity(32);
    for op in chunk {
        op.write_key(&mut key);

        let start = Instant::now();
        let outcome = access(cache, &key, value, cost, mode);
        let latency = start.elapsed();

        shared.lock().record(outcome, latency);
    }
}

/// get，未命中时 set
#[inline]
fn access<C: CacheUnderTest + ?Sized>(cache: &C, key: &str, value: &Bytes, cost: i64, mode: ErrorMode) -> Outcome {
    match cache.get(key) {
        Ok(Some(_)) => Outcome::Hit,
        Ok(None) => fill(cache, key, value, cost, mode),
        Err(_) => match mode {
            ErrorMode::Coarse => fill(cache, key, value, cost, mode),
            ErrorMode::Strict => Outcome::Error,
        },
    }
}

#[inline]
fn fill<C: CacheUnderTest + ?Sized>(cache: &C, key: &str, value: &Bytes, cost: i64, mode: ErrorMode) -> Outcome {
    match (cache.set(key, value.clone(), cost), mode) {
        (Err(_), ErrorMode::Strict) => Outcome::Error,
        _ => Outcome::Miss,
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
