// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::domain::models::WorkItem;
use crate::pipeline::signal::RunSignal;
use crate::queue::rate_limiter::{RateLimitMode, RateLimiter};

/// 工作器共享的任务队列接收端
///
/// 哪个工作器先拿到锁就取下一个工作项。
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// 创建有界任务队列
pub fn job_queue(capacity: usize) -> (mpsc::Sender<WorkItem>, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, Arc::new(Mutex::new(rx)))
}

/// 分发统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 提交的工作项数量
    pub submitted: usize,
    /// 成功入队的工作项数量
    pub dispatched: usize,
}

/// 分发器
///
/// 将工作项逐个送入有界任务队列。所有工作项入队或观察到取消后，
/// 丢弃发送端以关闭队列，这是空闲工作器唯一的终止信号。
pub struct Dispatcher {
    limiter: RateLimiter,
    mode: RateLimitMode,
    signal: RunSignal,
}

impl Dispatcher {
    pub fn new(limiter: RateLimiter, mode: RateLimitMode, signal: RunSignal) -> Self {
        Self {
            limiter,
            mode,
            signal,
        }
    }

    /// 分发全部工作项
    ///
    /// 在 `Enqueue` 模式下，每次入队前获取限流许可，入队成功后立即释放。
    ///
    /// # 参数
    ///
    /// * `items` - 全部工作项
    /// * `jobs` - 任务队列发送端，函数返回时被丢弃
    pub async fn dispatch(self, items: Vec<WorkItem>, jobs: mpsc::Sender<WorkItem>) -> DispatchStats {
        let mut stats = DispatchStats {
            submitted: items.len(),
            dispatched: 0,
        };

        for item in items {
            if self.signal.is_cancelled() {
                warn!(
                    remaining = stats.submitted - stats.dispatched,
                    "Dispatcher stopped due to cancellation"
                );
                break;
            }

            let permit = match self.mode {
                RateLimitMode::Enqueue => match self.limiter.acquire(&self.signal).await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        warn!(url = %item, "Dispatcher cancelled while waiting for rate limit slot");
                        break;
                    }
                },
                RateLimitMode::Execution => None,
            };

            let url = item.to_string();
            let sent = tokio::select! {
                biased;
                _ = self.signal.cancelled() => false,
                sent = jobs.send(item) => sent.is_ok(),
            };
            drop(permit);

            if !sent {
                warn!(url = %url, "Job queue unavailable, stopping dispatch");
                break;
            }
            stats.dispatched += 1;
        }

        drop(jobs);
        debug!(
            submitted = stats.submitted,
            dispatched = stats.dispatched,
            "Job queue closed"
        );
        stats
    }
}
