//! 结果输出模块
//! 每个 (场景, 后端) 一条记录，字段为 0 时也照常输出

use crate::engine::BenchmarkResult;
use crate::error::{AppError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 一次运行的汇总指标
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub config_id: String,
    pub cache_name: String,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub ops_per_sec: f64,
    pub hit_ratio: f64,
    pub evictions: u64,
    pub memory_mb: f64,
    pub errors: u64,
}

impl RunReport {
    pub fn from_result(config_id: &str, result: &BenchmarkResult) -> Self {
        let (p50_us, p95_us, p99_us) = result.percentiles.as_micros();
        Self {
            config_id: config_id.to_string(),
            cache_name: result.cache_name.clone(),
            p50_us,
            p95_us,
            p99_us,
            ops_per_sec: result.throughput(),
            hit_ratio: result.hit_ratio(),
            evictions: result.evictions,
            memory_mb: result.memory_mb,
            errors: result.errors,
        }
    }

    /// 单行摘要
    pub fn summary(&self) -> String {
        format!(
            "{}/{}: hit={:.2}% throughput={:.0}ops/s p50={:.0}us p95={:.0}us p99={:.0}us evictions={} mem={:.2}MB errors={}",
            self.config_id,
            self.cache_name,
            self.hit_ratio * 100.0,
            self.ops_per_sec,
            self.p50_us,
            self.p95_us,
            self.p99_us,
            self.evictions,
            self.memory_mb,
            self.errors,
        )
    }
}

/// 结果接收端
pub trait ResultSink {
    fn record(&mut self, report: &RunReport) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 收集到内存
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<RunReport>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, report: &RunReport) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// 写出五个 CSV 文件：latency / throughput / hitratio / evictions / memory
pub struct CsvSink {
    dir: PathBuf,
    latency: BufWriter<File>,
    throughput: BufWriter<File>,
    hit_ratio: BufWriter<File>,
    evictions: BufWriter<File>,
    memory: BufWriter<File>,
}

impl CsvSink {
    /// 创建目录和文件并写表头，失败即返回错误
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let open = |name: &str, header: &str| -> Result<BufWriter<File>> {
            let mut w = BufWriter::new(File::create(dir.join(name))?);
            writeln!(w, "{}", header)?;
            Ok(w)
        };

        Ok(Self {
            latency: open("latency.csv", "config,cache,p50_us,p95_us,p99_us")?,
            throughput: open("throughput.csv", "config,cache,ops_per_sec")?,
            hit_ratio: open("hitratio.csv", "config,cache,hit_ratio,errors")?,
            evictions: open("evictions.csv", "config,cache,evictions")?,
            memory: open("memory.csv", "config,cache,memory_mb")?,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultSink for CsvSink {
    fn record(&mut self, r: &RunReport) -> Result<()> {
        let config = escape_csv_field(&r.config_id);
        let cache = escape_csv_field(&r.cache_name);
        writeln!(
            self.latency,
            "{},{},{:.2},{:.2},{:.2}",
            config, cache, r.p50_us, r.p95_us, r.p99_us
        )?;
        writeln!(self.throughput, "{},{},{:.2}", config, cache, r.ops_per_sec)?;
        writeln!(self.hit_ratio, "{},{},{:.4},{}", config, cache, r.hit_ratio, r.errors)?;
        writeln!(self.evictions, "{},{},{}", config, cache, r.evictions)?;
        writeln!(self.memory, "{},{},{:.2}", config, cache, r.memory_mb)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for w in [
            &mut self.latency,
            &mut self.throughput,
            &mut self.hit_ratio,
            &mut self.evictions,
            &mut self.memory,
        ] {
            w.flush().map_err(|e| AppError::Sink(e.to_string()))?;
        }
        Ok(())
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
