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

use crate::config::settings::FetcherSettings;
use crate::domain::models::WorkItem;
use crate::engines::traits::{FetchError, Fetched, Fetcher};
use crate::pipeline::signal::RunSignal;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// 抓取引擎
///
/// 基于reqwest实现的HTTP抓取器。所有请求共享一个客户端连接池，
/// 每个请求的超时取运行信号的剩余时间。
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// 根据配置创建抓取器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取器配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestFetcher)` - 抓取器实例
    /// * `Err(reqwest::Error)` - 客户端构建失败（例如TLS后端初始化失败）
    pub fn new(settings: &FetcherSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    /// 使用已有客户端创建抓取器
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn parse_target(item: &WorkItem) -> Result<Url, FetchError> {
        let url = Url::parse(item.as_str()).map_err(|e| FetchError::RequestConstruction {
            url: item.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(FetchError::RequestConstruction {
                url: item.to_string(),
                reason: format!("unsupported protocol scheme \"{}\"", scheme),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    /// 执行HTTP抓取
    ///
    /// 非2xx状态码不视为失败，只报告读取到的字节数。
    async fn fetch(&self, item: &WorkItem, signal: &RunSignal) -> Result<Fetched, FetchError> {
        let url = Self::parse_target(item)?;

        if signal.is_cancelled() {
            return Err(FetchError::cancelled(item));
        }

        let request = self
            .client
            .get(url)
            .timeout(signal.remaining())
            .build()
            .map_err(|e| FetchError::RequestConstruction {
                url: item.to_string(),
                reason: describe(&e),
            })?;

        let start = Instant::now();
        let response = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(FetchError::cancelled(item)),
            response = self.client.execute(request) => {
                response.map_err(|e| FetchError::Transport {
                    url: item.to_string(),
                    reason: describe(&e),
                })?
            }
        };

        let status = response.status().as_u16();

        let body = tokio::select! {
            biased;
            _ = signal.cancelled() => {
                return Err(FetchError::BodyRead {
                    url: item.to_string(),
                    reason: "pipeline cancelled".to_string(),
                });
            }
            body = response.bytes() => {
                body.map_err(|e| FetchError::BodyRead {
                    url: item.to_string(),
                    reason: describe(&e),
                })?
            }
        };

        debug!(
            url = %item,
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch completed"
        );

        Ok(Fetched {
            item: item.clone(),
            bytes: body.len(),
            status,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

/// 展开错误链，reqwest 的顶层错误信息通常不包含根因
fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
