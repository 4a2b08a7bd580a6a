// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::models::FetchResult;

/// 结果汇聚器（fan-in）
///
/// 持续读取结果队列，直到队列被关闭并取空。
pub struct Aggregator {
    results: mpsc::Receiver<FetchResult>,
}

impl Aggregator {
    pub fn new(results: mpsc::Receiver<FetchResult>) -> Self {
        Self { results }
    }

    /// 收集全部结果
    ///
    /// 返回顺序为完成顺序，与提交顺序无关。
    pub async fn drain(mut self) -> Vec<FetchResult> {
        let mut collected = Vec::new();
        while let Some(result) = self.results.recv().await {
            trace!(url = %result.item(), outcome = result.outcome(), "Result collected");
            collected.push(result);
        }
        collected
    }
}
