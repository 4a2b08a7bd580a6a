// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 流水线模块
///
/// 运行信号、状态机、生命周期控制以及整体编排
pub mod lifecycle;
pub mod runner;
pub mod signal;
pub mod state;

pub use runner::{Pipeline, PipelineConfig, RunReport};
pub use signal::{CancelReason, RunSignal};
pub use state::PipelineState;
