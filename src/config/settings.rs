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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::queue::rate_limiter::RateLimitMode;
use crate::workers::fetch_worker::FaultIsolation;

/// 默认抓取目标
pub const DEFAULT_URLS: [&str; 3] = [
    "https://golang.org",
    "https://google.com",
    "https://github.com",
];

/// 应用程序配置设置
///
/// 包含流水线、抓取器、日志、指标和输出等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 流水线配置
    pub pipeline: PipelineSettings,
    /// 抓取器配置
    pub fetcher: FetcherSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 指标配置，整节可省略
    #[serde(default)]
    pub metrics: MetricsSettings,
    /// 输出配置
    pub output: OutputSettings,
}

/// 流水线配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 工作器数量
    pub workers: usize,
    /// 限流器容量
    pub rate_limit: usize,
    /// 全局截止时间（毫秒）
    pub deadline_ms: u64,
    /// 限流器作用位置
    pub limiter_mode: RateLimitMode,
    /// 故障隔离边界
    pub fault_isolation: FaultIsolation,
    /// 任务队列容量，缺省为工作项数量
    pub job_queue_capacity: Option<usize>,
    /// 结果队列容量，缺省为工作项数量
    pub result_queue_capacity: Option<usize>,
    /// 抓取目标
    pub urls: Vec<String>,
}

impl PipelineSettings {
    /// 全局截止时间
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// 抓取器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherSettings {
    /// User-Agent 请求头
    pub user_agent: String,
    /// 连接超时时间（毫秒）
    pub connect_timeout_ms: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("fetchpool/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// 每行一个JSON对象
    Json,
    /// 人类可读的文本
    Pretty,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 日志格式
    pub format: LogFormat,
    /// 默认过滤规则，RUST_LOG 优先
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info,fetchpool=debug".to_string(),
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus 导出器监听地址，未设置时不启动导出器
    pub listen_addr: Option<String>,
}

/// 结果输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// 每个结果一行文本
    Text,
    /// 每个结果一行JSON
    Json,
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 输出格式
    pub format: OutputFormat,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件和环境变量加载配置
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("FETCHPOOL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("pipeline.urls")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 仅包含内置默认值的配置构建器
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let fetcher = FetcherSettings::default();
        let logging = LoggingSettings::default();
        let urls: Vec<String> = DEFAULT_URLS.iter().map(|u| u.to_string()).collect();

        Config::builder()
            // Default pipeline settings
            .set_default("pipeline.workers", 5)?
            .set_default("pipeline.rate_limit", 5)?
            .set_default("pipeline.deadline_ms", 10_000)?
            .set_default("pipeline.limiter_mode", "execution")?
            .set_default("pipeline.fault_isolation", "per_item")?
            .set_default("pipeline.urls", urls)?
            // Default fetcher settings
            .set_default("fetcher.user_agent", fetcher.user_agent)?
            .set_default("fetcher.connect_timeout_ms", fetcher.connect_timeout_ms as i64)?
            // Default logging settings
            .set_default("logging.format", "json")?
            .set_default("logging.filter", logging.filter)?
            // Default output settings
            .set_default("output.format", "text")
    }
}
