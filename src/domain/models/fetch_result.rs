// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::work_item::WorkItem;
use crate::engines::traits::{FetchError, Fetched};

/// 抓取错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// 无法为工作项构造合法请求
    RequestConstruction,
    /// 连接或请求失败（DNS、TCP、TLS、超时、取消）
    Transport,
    /// 已收到响应，但响应体未能完整读取
    BodyRead,
    /// 工作器在处理工作项时捕获到的意外故障
    UnexpectedFault,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::RequestConstruction => write!(f, "request_construction"),
            FetchErrorKind::Transport => write!(f, "transport"),
            FetchErrorKind::BodyRead => write!(f, "body_read"),
            FetchErrorKind::UnexpectedFault => write!(f, "unexpected_fault"),
        }
    }
}

/// 抓取结果
///
/// 每个被工作器取出的工作项恰好产生一个结果，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchResult {
    /// 抓取成功
    Success {
        /// 工作项
        item: WorkItem,
        /// 读取的字节数
        bytes: usize,
        /// HTTP状态码
        status: u16,
    },
    /// 抓取失败
    Failure {
        /// 工作项
        item: WorkItem,
        /// 错误种类
        kind: FetchErrorKind,
        /// 错误详情
        detail: String,
    },
}

impl FetchResult {
    /// 获取结果对应的工作项
    pub fn item(&self) -> &WorkItem {
        match self {
            FetchResult::Success { item, .. } | FetchResult::Failure { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// 失败时返回错误种类
    pub fn error_kind(&self) -> Option<FetchErrorKind> {
        match self {
            FetchResult::Success { .. } => None,
            FetchResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// 成功结果的可读摘要（字节数与来源）
    pub fn descriptor(&self) -> Option<String> {
        match self {
            FetchResult::Success { item, bytes, .. } => {
                Some(format!("Fetched {} bytes from {}", bytes, item))
            }
            FetchResult::Failure { .. } => None,
        }
    }

    /// 标签值，用于指标和日志
    pub fn outcome(&self) -> &'static str {
        if self.is_success() {
            "success"
        } else {
            "failure"
        }
    }
}

impl From<Fetched> for FetchResult {
    fn from(fetched: Fetched) -> Self {
        FetchResult::Success {
            item: fetched.item,
            bytes: fetched.bytes,
            status: fetched.status,
        }
    }
}

impl FetchResult {
    /// 将抓取错误转换为失败结果
    pub fn from_error(item: WorkItem, error: &FetchError) -> Self {
        FetchResult::Failure {
            item,
            kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchResult::Success { item, bytes, .. } => {
                write!(f, "Fetched {} bytes from {}", bytes, item)
            }
            FetchResult::Failure { detail, .. } => write!(f, "Error: {}", detail),
        }
    }
}
