// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含工作项和抓取结果
pub mod domain;

/// 引擎模块
///
/// 抓取器特质及其HTTP实现
pub mod engines;

/// 基础设施模块
///
/// 指标导出
pub mod infrastructure;

/// 流水线模块
///
/// 运行信号、状态机、生命周期控制与编排
pub mod pipeline;

/// 队列模块
///
/// 任务分发与限流
pub mod queue;

/// 工具模块
///
/// 错误类型与日志
pub mod utils;

/// 工作器模块
///
/// 工作器、工作器池与结果汇聚
pub mod workers;
