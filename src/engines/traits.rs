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

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{FetchErrorKind, WorkItem};
use crate::pipeline::signal::RunSignal;

/// 抓取错误类型
///
/// 每种错误都只影响单个工作项，不会中止流水线。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 工作项无法转换为合法请求
    #[error("request creation failed for {url}: {reason}")]
    RequestConstruction { url: String, reason: String },
    /// 连接或请求失败
    #[error("error fetching {url}: {reason}")]
    Transport { url: String, reason: String },
    /// 响应体读取失败
    #[error("error reading body of {url}: {reason}")]
    BodyRead { url: String, reason: String },
    /// 处理过程中的意外故障
    #[error("unexpected fault while fetching {url}: {reason}")]
    UnexpectedFault { url: String, reason: String },
}

impl FetchError {
    /// 获取错误种类
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::RequestConstruction { .. } => FetchErrorKind::RequestConstruction,
            FetchError::Transport { .. } => FetchErrorKind::Transport,
            FetchError::BodyRead { .. } => FetchErrorKind::BodyRead,
            FetchError::UnexpectedFault { .. } => FetchErrorKind::UnexpectedFault,
        }
    }

    /// 运行信号已触发时使用的传输错误
    pub fn cancelled(item: &WorkItem) -> Self {
        FetchError::Transport {
            url: item.to_string(),
            reason: "pipeline cancelled".to_string(),
        }
    }
}

/// 一次成功抓取的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// 工作项
    pub item: WorkItem,
    /// 响应体字节数
    pub bytes: usize,
    /// HTTP状态码
    pub status: u16,
}

/// 抓取器特质
///
/// 对一个工作项执行一次网络抓取，受运行信号的截止时间约束。
/// 实现不应 panic；意外故障由工作器捕获并转换为失败结果。
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, item: &WorkItem, signal: &RunSignal) -> Result<Fetched, FetchError>;

    /// 抓取器名称
    fn name(&self) -> &'static str;
}
