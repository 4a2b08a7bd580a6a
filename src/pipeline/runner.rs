// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::settings::PipelineSettings;
use crate::domain::models::{FetchResult, WorkItem};
use crate::engines::traits::Fetcher;
use crate::pipeline::lifecycle::{CloseReport, LifecycleController};
use crate::pipeline::signal::{CancelReason, RunSignal};
use crate::pipeline::state::PipelineState;
use crate::queue::dispatcher::{job_queue, DispatchStats, Dispatcher};
use crate::queue::rate_limiter::{RateLimitMode, RateLimiter};
use crate::utils::errors::PipelineError;
use crate::workers::aggregator::Aggregator;
use crate::workers::fetch_worker::{FaultIsolation, FetchWorker};
use crate::workers::manager::WorkerPool;

/// 流水线配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 工作器数量 W
    pub workers: usize,
    /// 限流器容量 C
    pub rate_limit: usize,
    /// 全局截止时间
    pub deadline: Duration,
    /// 限流器作用位置
    pub limiter_mode: RateLimitMode,
    /// 故障隔离边界
    pub fault_isolation: FaultIsolation,
    /// 任务队列容量，缺省为工作项数量
    pub job_queue_capacity: Option<usize>,
    /// 结果队列容量，缺省为工作项数量
    pub result_queue_capacity: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            rate_limit: 5,
            deadline: Duration::from_secs(10),
            limiter_mode: RateLimitMode::default(),
            fault_isolation: FaultIsolation::default(),
            job_queue_capacity: None,
            result_queue_capacity: None,
        }
    }
}

impl PipelineConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.rate_limit == 0 {
            return Err(PipelineError::InvalidConfig(
                "rate_limit must be at least 1".to_string(),
            ));
        }
        if self.job_queue_capacity == Some(0) || self.result_queue_capacity == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            workers: settings.workers,
            rate_limit: settings.rate_limit,
            deadline: settings.deadline(),
            limiter_mode: settings.limiter_mode,
            fault_isolation: settings.fault_isolation,
            job_queue_capacity: settings.job_queue_capacity,
            result_queue_capacity: settings.result_queue_capacity,
        }
    }
}

/// 运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 运行ID
    pub run_id: Uuid,
    /// 最终状态（Completed 或 Cancelled）
    pub state: PipelineState,
    /// 按完成顺序排列的结果
    pub results: Vec<FetchResult>,
    /// 提交的工作项数量
    pub submitted: usize,
    /// 入队的工作项数量
    pub dispatched: usize,
    /// 捕获到的意外故障数量
    pub faults: usize,
    /// 限流器观察到的最大持有数
    pub peak_in_flight: usize,
    /// 取消原因
    pub cancel_reason: Option<CancelReason>,
    /// 运行耗时
    pub elapsed: Duration,
}

impl RunReport {
    pub fn successes(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// 抓取流水线
///
/// 分发器 → 有界任务队列 → W 个工作器 → 有界结果队列 → 汇聚器。
/// 每次运行拥有独立的限流器、队列和日志 span，可以串行或并发执行多次。
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl Pipeline {
    /// 创建流水线
    ///
    /// # 参数
    ///
    /// * `config` - 流水线配置
    /// * `fetcher` - 抓取器
    ///
    /// # 返回值
    ///
    /// * `Ok(Pipeline)` - 流水线实例
    /// * `Err(PipelineError::InvalidConfig)` - 配置无效
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 以配置的截止时间运行
    pub async fn run(&self, items: Vec<WorkItem>) -> RunReport {
        self.run_with_signal(items, RunSignal::with_budget(self.config.deadline))
            .await
    }

    /// 使用外部运行信号运行，调用方可随时取消
    pub async fn run_with_signal(&self, items: Vec<WorkItem>, signal: RunSignal) -> RunReport {
        let run_id = Uuid::new_v4();
        self.execute(run_id, items, signal)
            .instrument(info_span!("fetch_run", %run_id))
            .await
    }

    async fn execute(&self, run_id: Uuid, items: Vec<WorkItem>, signal: RunSignal) -> RunReport {
        let started = Instant::now();
        let submitted = items.len();
        let job_capacity = self.config.job_queue_capacity.unwrap_or(submitted).max(1);
        let result_capacity = self.config.result_queue_capacity.unwrap_or(submitted).max(1);

        let controller = LifecycleController::new(signal.clone());
        let limiter = RateLimiter::new(self.config.rate_limit);
        let (job_tx, job_rx) = job_queue(job_capacity);
        let (result_tx, result_rx) = mpsc::channel(result_capacity);

        controller.start();
        info!(
            items = submitted,
            workers = self.config.workers,
            rate_limit = self.config.rate_limit,
            limiter_mode = ?self.config.limiter_mode,
            deadline_ms = self.config.deadline.as_millis() as u64,
            "Pipeline started"
        );

        let dispatcher = Dispatcher::new(limiter.clone(), self.config.limiter_mode, signal.clone());
        let dispatch = tokio::spawn(
            dispatcher
                .dispatch(items, job_tx)
                .instrument(info_span!("dispatcher")),
        );

        let pool = WorkerPool::spawn(
            self.config.workers,
            |id| {
                FetchWorker::new(
                    id,
                    self.fetcher.clone(),
                    limiter.clone(),
                    self.config.limiter_mode,
                    self.config.fault_isolation,
                    signal.clone(),
                )
            },
            &job_rx,
            &result_tx,
            controller.completion(),
        );
        drop(job_rx);

        let closer = controller.spawn_closer(pool, result_tx);
        let results = Aggregator::new(result_rx).drain().await;

        let close = closer.await.unwrap_or_else(|e| {
            error!(error = %e, "Closer task failed");
            CloseReport::default()
        });
        let dispatch = dispatch.await.unwrap_or_else(|e| {
            error!(error = %e, "Dispatcher task failed");
            DispatchStats {
                submitted,
                dispatched: 0,
            }
        });

        let state = controller.finish();
        let report = RunReport {
            run_id,
            state,
            results,
            submitted: dispatch.submitted,
            dispatched: dispatch.dispatched,
            faults: close.faults,
            peak_in_flight: limiter.peak(),
            cancel_reason: signal.reason().filter(|_| state == PipelineState::Cancelled),
            elapsed: started.elapsed(),
        };

        info!(
            state = %report.state,
            results = report.results.len(),
            dispatched = report.dispatched,
            faults = report.faults,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pipeline finished"
        );
        report
    }
}
