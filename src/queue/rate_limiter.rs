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

use metrics::gauge;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::pipeline::signal::RunSignal;

/// 限流器作用位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitMode {
    /// 限制同时进行的抓取数：抓取前获取许可，抓取完成后释放
    #[default]
    Execution,
    /// 限制入队速率：入队前获取许可，入队成功后立即释放
    Enqueue,
}

/// 获取许可时运行信号已触发
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate limiter acquire cancelled")]
pub struct AcquireCancelled;

/// 计数信号量限流器
///
/// 容量为 C，当前持有数 c 始终满足 0 <= c <= C。
/// 许可以 RAII 方式持有，在所有路径（包括取消和 panic 展开）上都会被释放。
#[derive(Clone, Debug)]
pub struct RateLimiter {
    /// 底层信号量
    semaphore: Arc<Semaphore>,
    /// 配置容量
    capacity: usize,
    /// 当前持有数
    outstanding: Arc<AtomicUsize>,
    /// 观察到的最大持有数
    peak: Arc<AtomicUsize>,
}

impl RateLimiter {
    /// 创建一个新的限流器
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大并发许可数，必须大于0
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            outstanding: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 获取许可
    ///
    /// 阻塞直到 c < C；若等待期间运行信号触发，返回 `AcquireCancelled`。
    ///
    /// # 返回值
    ///
    /// * `Ok(RatePermit)` - 许可，drop 时释放
    /// * `Err(AcquireCancelled)` - 运行已取消
    pub async fn acquire(&self, signal: &RunSignal) -> Result<RatePermit, AcquireCancelled> {
        if signal.is_cancelled() {
            return Err(AcquireCancelled);
        }

        let permit = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(AcquireCancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                // The semaphore is never closed while a limiter handle exists.
                permit.map_err(|_| AcquireCancelled)?
            }
        };

        let held = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(held, Ordering::SeqCst);
        gauge!("fetchpool_rate_limiter_in_flight").set(held as f64);

        Ok(RatePermit {
            outstanding: self.outstanding.clone(),
            _permit: permit,
        })
    }

    /// 配置容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前持有数
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// 观察到的最大持有数
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// 限流许可
///
/// 持有期间占用一个容量单位。
#[derive(Debug)]
pub struct RatePermit {
    outstanding: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl RatePermit {
    /// 显式释放许可
    pub fn release(self) {}
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        // Decrement before the semaphore permit is returned so `outstanding`
        // can never be observed above capacity.
        let held = self.outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
        gauge!("fetchpool_rate_limiter_in_flight").set(held as f64);
    }
}
