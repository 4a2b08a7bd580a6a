// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::utils::errors::PipelineError;

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// 尚未启动
    Idle,
    /// 分发与工作并行进行
    Running,
    /// 所有工作器已退出，结果队列已关闭，汇聚器正在取空
    Draining,
    /// 正常完成
    Completed,
    /// 截止时间到达或外部取消，结果可能不完整
    Cancelled,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Cancelled)
    }

    /// 是否允许转换到 `next`
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Draining)
                | (Running, Cancelled)
                | (Draining, Completed)
                | (Draining, Cancelled)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Running => write!(f, "running"),
            PipelineState::Draining => write!(f, "draining"),
            PipelineState::Completed => write!(f, "completed"),
            PipelineState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 流水线状态机
#[derive(Debug)]
pub struct PipelineStateMachine {
    state: Mutex<PipelineState>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn current(&self) -> PipelineState {
        *self.state.lock()
    }

    /// 执行状态转换
    ///
    /// # 返回值
    ///
    /// * `Ok(PipelineState)` - 转换前的状态
    /// * `Err(PipelineError::InvalidTransition)` - 不允许的转换
    pub fn transition(&self, next: PipelineState) -> Result<PipelineState, PipelineError> {
        let mut state = self.state.lock();
        let from = *state;
        if !from.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition { from, to: next });
        }
        *state = next;
        debug!(from = %from, to = %next, "Pipeline state changed");
        Ok(from)
    }
}
