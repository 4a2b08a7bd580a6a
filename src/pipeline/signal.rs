// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 取消原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// 外部请求取消（例如 Ctrl-C）
    Requested,
    /// 截止时间已过
    DeadlineElapsed,
}

/// 运行信号
///
/// 每次运行创建一次，带有固定的时间预算。所有克隆共享同一个取消令牌
/// 和截止时间。状态只会从运行中变为已取消，不会重置。
#[derive(Clone, Debug)]
pub struct RunSignal {
    token: CancellationToken,
    deadline: Instant,
    reason: Arc<Mutex<Option<CancelReason>>>,
}

impl RunSignal {
    /// 以给定时间预算创建运行信号
    pub fn with_budget(budget: Duration) -> Self {
        Self::with_deadline(Instant::now() + budget)
    }

    /// 以绝对截止时间创建运行信号
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline,
            reason: Arc::new(Mutex::new(None)),
        }
    }

    /// 请求取消本次运行
    pub fn cancel(&self) {
        self.mark(CancelReason::Requested);
        self.token.cancel();
    }

    /// 信号是否已触发
    pub fn is_cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        if Instant::now() >= self.deadline {
            self.mark(CancelReason::DeadlineElapsed);
            return true;
        }
        false
    }

    /// 等待信号触发（取消请求或截止时间到达）
    pub async fn cancelled(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep_until(self.deadline) => {
                self.mark(CancelReason::DeadlineElapsed);
            }
        }
    }

    /// 距离截止时间的剩余时间
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// 本次运行的绝对截止时间
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// 信号触发的原因，未触发时返回 None
    pub fn reason(&self) -> Option<CancelReason> {
        // Refresh the deadline check so an elapsed budget is reported
        // even when nothing awaited `cancelled()`.
        self.is_cancelled();
        *self.reason.lock()
    }

    fn mark(&self, reason: CancelReason) {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
    }
}
