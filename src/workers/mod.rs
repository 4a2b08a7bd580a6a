// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供抓取工作器、工作器池以及结果汇聚
pub mod aggregator;
pub mod fetch_worker;
pub mod manager;

pub use aggregator::Aggregator;
pub use fetch_worker::{FaultIsolation, FetchWorker, WorkerStats};
pub use manager::WorkerPool;
