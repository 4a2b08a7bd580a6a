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

use futures::FutureExt;
use metrics::counter;
use serde::Deserialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::domain::models::{FetchResult, WorkItem};
use crate::engines::traits::{FetchError, Fetcher};
use crate::pipeline::signal::RunSignal;
use crate::queue::dispatcher::JobReceiver;
use crate::queue::rate_limiter::{RateLimitMode, RateLimiter};

/// 故障隔离边界
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultIsolation {
    /// 每个工作项单独隔离，故障后工作器继续处理后续工作项
    #[default]
    PerItem,
    /// 故障后工作器为该工作项产生失败结果并退出
    PerWorker,
}

/// 工作器统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// 已产生结果的工作项数量
    pub processed: usize,
    /// 捕获到的意外故障数量
    pub faults: usize,
}

enum Next {
    Item(WorkItem),
    Closed,
    Cancelled,
}

/// 抓取工作者
///
/// 从共享任务队列取工作项，调用抓取器，并把结果推入结果队列。
pub struct FetchWorker {
    id: usize,
    fetcher: Arc<dyn Fetcher>,
    limiter: RateLimiter,
    mode: RateLimitMode,
    isolation: FaultIsolation,
    signal: RunSignal,
}

impl FetchWorker {
    /// 创建新的抓取工作器实例
    pub fn new(
        id: usize,
        fetcher: Arc<dyn Fetcher>,
        limiter: RateLimiter,
        mode: RateLimitMode,
        isolation: FaultIsolation,
        signal: RunSignal,
    ) -> Self {
        Self {
            id,
            fetcher,
            limiter,
            mode,
            isolation,
            signal,
        }
    }

    /// 工作器编号
    pub fn id(&self) -> usize {
        self.id
    }

    /// 运行抓取工作器
    ///
    /// 队列关闭且取空时正常退出；运行信号触发时不再取新的工作项。
    /// 每个取出的工作项恰好产生一个结果。
    pub async fn run(self, jobs: JobReceiver, results: mpsc::Sender<FetchResult>) -> WorkerStats {
        debug!(worker_id = self.id, fetcher = self.fetcher.name(), "Worker started");
        let mut stats = WorkerStats::default();

        loop {
            let item = match self.next(&jobs).await {
                Next::Item(item) => item,
                Next::Closed => break,
                Next::Cancelled => {
                    warn!(worker_id = self.id, "Worker stopped due to cancellation");
                    break;
                }
            };

            let outcome = AssertUnwindSafe(self.process(&item)).catch_unwind().await;
            let (result, faulted) = match outcome {
                Ok(result) => (result, false),
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!(worker_id = self.id, url = %item, error = %reason, "Panic occurred");
                    counter!("fetchpool_worker_faults_total").increment(1);
                    let fault = FetchError::UnexpectedFault {
                        url: item.to_string(),
                        reason,
                    };
                    (FetchResult::from_error(item, &fault), true)
                }
            };

            counter!("fetchpool_results_total", "outcome" => result.outcome()).increment(1);
            stats.processed += 1;

            if results.send(result).await.is_err() {
                warn!(worker_id = self.id, "Result queue closed, worker exiting");
                break;
            }

            if faulted {
                stats.faults += 1;
                if self.isolation == FaultIsolation::PerWorker {
                    warn!(worker_id = self.id, "Worker abandoning remaining backlog after fault");
                    break;
                }
            }
        }

        debug!(
            worker_id = self.id,
            processed = stats.processed,
            faults = stats.faults,
            "Worker exited"
        );
        stats
    }

    async fn next(&self, jobs: &JobReceiver) -> Next {
        tokio::select! {
            biased;
            _ = self.signal.cancelled() => Next::Cancelled,
            item = async { jobs.lock().await.recv().await } => match item {
                Some(item) => Next::Item(item),
                None => Next::Closed,
            },
        }
    }

    async fn process(&self, item: &WorkItem) -> FetchResult {
        // Held across the fetch in execution mode, released on every exit path.
        let _permit = match self.mode {
            RateLimitMode::Execution => match self.limiter.acquire(&self.signal).await {
                Ok(permit) => Some(permit),
                Err(_) => return FetchResult::from_error(item.clone(), &FetchError::cancelled(item)),
            },
            RateLimitMode::Enqueue => None,
        };

        match self.fetcher.fetch(item, &self.signal).await {
            Ok(fetched) => fetched.into(),
            Err(e) => {
                error!(worker_id = self.id, url = %item, kind = %e.kind(), "{}", e);
                FetchResult::from_error(item.clone(), &e)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
