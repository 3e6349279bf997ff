//! 场景编排模块
//! 场景 × 后端：构造、回放、关闭、输出

use crate::backends::BackendKind;
use crate::cache::{CacheGuard, CacheUnderTest};
use crate::config::{Scenario, messages};
use crate::engine::BenchmarkEngine;
use crate::error::{ErrorContext, Result};
use crate::report::{ResultSink, RunReport};
use crate::workload::{Workload, WorkloadBuilder};
use tracing::{error, info, warn};

/// 通用场景运行器
pub struct Harness<'a> {
    engine: BenchmarkEngine,
    sink: &'a mut dyn ResultSink,
}

impl<'a> Harness<'a> {
    pub fn new(engine: BenchmarkEngine, sink: &'a mut dyn ResultSink) -> Self {
        Self { engine, sink }
    }

    /// 依次运行所有场景，结束时 flush
    pub fn run_all(&mut self, scenarios: &[Scenario], backends: &[BackendKind]) -> Result<Vec<RunReport>> {
        let mut reports = Vec::new();
        for scenario in scenarios {
            reports.extend(self.run_scenario(scenario, backends)?);
        }
        self.sink.flush().with_context(messages::SINK_WRITE_FAILED)?;
        Ok(reports)
    }

    /// 工作负载只生成一次，所有后端共用
    pub fn run_scenario(&mut self, scenario: &Scenario, backends: &[BackendKind]) -> Result<Vec<RunReport>> {
        info!(
            scenario = %scenario.id,
            keys = scenario.workload.key_space_size,
            ops = scenario.workload.total_ops,
            value_size = scenario.workload.value_size,
            skew = scenario.workload.skew,
            "running scenario"
        );
        let workload = WorkloadBuilder::build(&scenario.workload).with_context(messages::WORKLOAD_GEN_FAILED)?;

        let mut reports = Vec::with_capacity(backends.len());
        for kind in backends {
            // 构造失败只跳过该后端
            let cache = match kind.build(scenario) {
                Ok(cache) => cache,
                Err(e) => {
                    warn!(scenario = %scenario.id, backend = ?kind, error = %e, "{}", messages::BACKEND_INIT_FAILED);
                    continue;
                }
            };
            if let Some(report) = self.run_backend(&scenario.id, cache, &workload)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// 跑单个后端；无论结果如何缓存都会在返回前关闭
    ///
    /// 回放失败记录日志并返回 `None`，只有写结果失败才返回错误。
    pub fn run_backend<C: CacheUnderTest>(
        &mut self,
        scenario_id: &str,
        cache: C,
        workload: &Workload,
    ) -> Result<Option<RunReport>> {
        let mut guard = CacheGuard::new(cache);
        info!(scenario = scenario_id, cache = guard.name(), "→ running backend");

        let outcome = self.engine.run(&*guard, workload);
        if let Err(e) = guard.close() {
            warn!(scenario = scenario_id, error = %e, "close failed");
        }
        drop(guard);

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(scenario = scenario_id, error = %e, "{}", messages::BENCHMARK_FAILED);
                return Ok(None);
            }
        };

        let report = RunReport::from_result(scenario_id, &result);
        info!("{}", report.summary());
        self.sink.record(&report).with_context(messages::SINK_WRITE_FAILED)?;
        Ok(Some(report))
    }
}
