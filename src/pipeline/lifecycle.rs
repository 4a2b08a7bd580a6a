// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::domain::models::FetchResult;
use crate::pipeline::signal::RunSignal;
use crate::pipeline::state::{PipelineState, PipelineStateMachine};
use crate::workers::manager::WorkerPool;

/// 完成计数器
///
/// 记录仍在运行的工作器数量，仅用于观测。
/// 关闭任务通过逐个等待工作器句柄判断全部退出，不依赖该计数。
#[derive(Clone, Debug, Default)]
pub struct CompletionCounter {
    active: Arc<AtomicUsize>,
}

impl CompletionCounter {
    /// 创建计数为零的计数器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个工作器，返回的守卫在工作器退出时递减计数
    pub fn enter(&self) -> CompletionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        CompletionGuard {
            active: self.active.clone(),
        }
    }

    /// 当前仍在运行的工作器数量
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// 完成守卫
#[derive(Debug)]
pub struct CompletionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 关闭报告
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseReport {
    /// 所有工作器产生的结果总数
    pub processed: usize,
    /// 捕获到的意外故障总数
    pub faults: usize,
    /// 异常终止的工作器任务数
    pub aborted_workers: usize,
}

/// 生命周期控制器
///
/// 持有运行信号，并保证结果队列在所有工作器退出后恰好关闭一次。
pub struct LifecycleController {
    signal: RunSignal,
    state: Arc<PipelineStateMachine>,
    completion: CompletionCounter,
}

impl LifecycleController {
    /// 创建处于空闲状态的控制器
    pub fn new(signal: RunSignal) -> Self {
        Self {
            signal,
            state: Arc::new(PipelineStateMachine::new()),
            completion: CompletionCounter::new(),
        }
    }

    /// 本次运行的取消信号
    pub fn signal(&self) -> &RunSignal {
        &self.signal
    }

    /// 工作器完成计数器
    pub fn completion(&self) -> &CompletionCounter {
        &self.completion
    }

    /// 当前流水线状态
    pub fn state(&self) -> PipelineState {
        self.state.current()
    }

    /// 进入运行状态
    pub fn start(&self) {
        self.advance(PipelineState::Running);
    }

    /// 启动关闭任务
    ///
    /// 等待全部工作器退出后丢弃最后一个结果发送端，从而关闭结果队列。
    /// 工作器任务异常终止属于不可恢复故障，此时取消整个运行。
    pub fn spawn_closer(
        &self,
        pool: WorkerPool,
        results: mpsc::Sender<FetchResult>,
    ) -> JoinHandle<CloseReport> {
        let signal = self.signal.clone();
        let state = self.state.clone();
        let completion = self.completion.clone();

        tokio::spawn(
            async move {
                let mut report = CloseReport::default();
                for handle in pool.into_handles() {
                    match handle.await {
                        Ok(stats) => {
                            report.processed += stats.processed;
                            report.faults += stats.faults;
                        }
                        Err(e) => {
                            error!(error = %e, "Worker task terminated abnormally, cancelling run");
                            report.aborted_workers += 1;
                            signal.cancel();
                        }
                    }
                }

                debug_assert_eq!(completion.active(), 0);

                let next = if signal.is_cancelled() {
                    PipelineState::Cancelled
                } else {
                    PipelineState::Draining
                };
                if let Err(e) = state.transition(next) {
                    warn!(error = %e, "Unexpected pipeline state at queue closure");
                }

                drop(results);
                debug!(processed = report.processed, "Result queue closed");
                report
            }
            .instrument(info_span!("closer")),
        )
    }

    /// 汇聚器返回后结束运行，返回最终状态
    ///
    /// 排空期间信号触发的运行同样以 `Cancelled` 结束。
    pub fn finish(&self) -> PipelineState {
        if self.state.current() == PipelineState::Draining {
            let next = if self.signal.is_cancelled() {
                PipelineState::Cancelled
            } else {
                PipelineState::Completed
            };
            self.advance(next);
        }
        self.state.current()
    }

    fn advance(&self, next: PipelineState) {
        if let Err(e) = self.state.transition(next) {
            warn!(error = %e, "Ignoring pipeline state change");
        }
    }
}
