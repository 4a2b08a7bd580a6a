// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use crate::domain::models::FetchResult;
use crate::pipeline::lifecycle::CompletionCounter;
use crate::queue::dispatcher::JobReceiver;
use crate::workers::fetch_worker::{FetchWorker, WorkerStats};

/// 工作器池
///
/// 在流水线启动时创建固定数量的并行工作器，共享同一任务队列。
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// 启动工作器
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作器数量
    /// * `build` - 按工作器编号构造工作器
    /// * `jobs` - 共享任务队列
    /// * `results` - 结果队列发送端，每个工作器持有一个克隆
    /// * `completion` - 完成计数器，工作器退出时递减
    pub fn spawn<F>(
        count: usize,
        build: F,
        jobs: &JobReceiver,
        results: &mpsc::Sender<FetchResult>,
        completion: &CompletionCounter,
    ) -> Self
    where
        F: Fn(usize) -> FetchWorker,
    {
        let handles = (0..count)
            .map(|id| {
                let worker = build(id);
                let jobs = jobs.clone();
                let results = results.clone();
                let guard = completion.enter();
                tokio::spawn(
                    async move {
                        let _guard = guard;
                        worker.run(jobs, results).await
                    }
                    .instrument(info_span!("worker", worker_id = id)),
                )
            })
            .collect();

        Self { handles }
    }

    /// 已启动的工作器数量
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 取出全部工作器句柄，由生命周期控制器等待
    pub fn into_handles(self) -> Vec<JoinHandle<WorkerStats>> {
        self.handles
    }
}
