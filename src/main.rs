use cap::Cap;
use clap::{Parser, ValueEnum};
use std::alloc::System;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use zipf_cache_bench::backends::BackendKind;
use zipf_cache_bench::config::{
    BASE_VALUE_SIZE, ChunkPolicy, DEFAULT_SEED, DEFAULT_WORKERS, EngineConfig, ErrorMode, HitAccounting,
    RESULTS_DIR, Scenario, WorkloadConfig, messages, presets,
};
use zipf_cache_bench::engine::BenchmarkEngine;
use zipf_cache_bench::error::{ErrorContext, Result};
use zipf_cache_bench::harness::Harness;
use zipf_cache_bench::memory::AllocatorProbe;
use zipf_cache_bench::percentile::RankRule;
use zipf_cache_bench::report::CsvSink;
use zipf_cache_bench::sampler::ZipfMethod;

#[global_allocator]
static ALLOCATOR: Cap<System> = Cap::new(System, usize::MAX);

/// 场景集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Suite {
    /// Every preset sweep
    All,
    /// Cache budget sweep
    Size,
    /// Value size sweep
    Value,
    /// Skew sweep
    Skew,
    /// A single scenario built from the custom flags
    Custom,
}

#[derive(Parser, Debug)]
#[command(name = "cache-bench")]
#[command(about = "Replay a reproducible Zipfian workload against several caches")]
struct Args {
    /// Scenario suite to run
    #[arg(long, value_enum, default_value_t = Suite::All)]
    suite: Suite,

    /// Divide preset key spaces, op counts and budgets by this factor
    #[arg(long, default_value_t = 1)]
    scale: u64,

    /// Backends to run (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    backend: Vec<BackendKind>,

    /// Directory for the CSV result files
    #[arg(long, env = "CACHE_BENCH_RESULTS_DIR", default_value = RESULTS_DIR)]
    results_dir: PathBuf,

    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// How to split operations that do not divide evenly across workers
    #[arg(long, value_enum, default_value_t)]
    chunk_policy: ChunkPolicy,

    /// Which hit/miss counters end up in the result
    #[arg(long, value_enum, default_value_t)]
    accounting: HitAccounting,

    /// Count backend errors separately instead of folding them into misses
    #[arg(long)]
    strict: bool,

    /// Percentile rank rule
    #[arg(long, value_enum, default_value_t)]
    rank_rule: RankRule,

    /// Zipf sampling method
    #[arg(long, value_enum, default_value_t)]
    zipf_method: ZipfMethod,

    /// Custom scenario label
    #[arg(long, default_value = "custom")]
    id: String,

    /// Custom scenario seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Custom scenario key space size
    #[arg(long, default_value_t = 1_000_000)]
    keys: u64,

    /// Custom scenario operation count
    #[arg(long, default_value_t = 2_000_000)]
    ops: usize,

    /// Custom scenario value size in bytes
    #[arg(long, default_value_t = BASE_VALUE_SIZE)]
    value_size: usize,

    /// Custom scenario skew (0 = uniform)
    #[arg(long, default_value_t = 0.99)]
    skew: f64,

    /// Custom scenario cache budget in MB
    #[arg(long, default_value_t = 256)]
    capacity_mb: u64,
}

impl Args {
    fn scenarios(&self) -> Vec<Scenario> {
        let mut scenarios = match self.suite {
            Suite::All => presets::all(self.scale),
            Suite::Size => presets::cache_size_sweep(self.scale),
            Suite::Value => presets::value_size_sweep(self.scale),
            Suite::Skew => presets::skew_sweep(self.scale),
            Suite::Custom => vec![Scenario::new(
                self.id.clone(),
                WorkloadConfig::new(self.seed, self.keys, self.ops, self.value_size, self.skew),
                self.capacity_mb << 20,
            )],
        };
        for scenario in &mut scenarios {
            scenario.workload.method = self.zipf_method;
        }
        scenarios
    }

    fn backends(&self) -> Vec<BackendKind> {
        if self.backend.is_empty() {
            BackendKind::ALL.to_vec()
        } else {
            self.backend.clone()
        }
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        let mode = if self.strict { ErrorMode::Strict } else { ErrorMode::Coarse };
        Ok(EngineConfig::default()
            .with_workers(self.workers)?
            .with_chunk_policy(self.chunk_policy)
            .with_accounting(self.accounting)
            .with_error_mode(mode)
            .with_rank_rule(self.rank_rule))
    }
}

fn run(args: Args) -> Result<()> {
    let scenarios = args.scenarios();
    for scenario in &scenarios {
        scenario.workload.validate().with_context(&scenario.id)?;
    }
    let engine = BenchmarkEngine::new(args.engine_config()?).with_probe(Arc::new(AllocatorProbe::new(&ALLOCATOR)));

    // 无法创建结果文件时直接退出
    let mut sink = CsvSink::create(&args.results_dir).with_context(messages::SINK_CREATE_FAILED)?;
    info!(dir = %sink.dir().display(), scenarios = scenarios.len(), "writing results");

    let backends = args.backends();
    Harness::new(engine, &mut sink).run_all(&scenarios, &backends)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
