// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 实现有界任务队列的分发以及计数信号量限流
pub mod dispatcher;
pub mod rate_limiter;
