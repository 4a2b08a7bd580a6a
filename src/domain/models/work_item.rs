// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 工作项
///
/// 一次抓取的目标标识（URL字符串）。创建后不可变，
/// 在交给工作器之前只由分发器持有。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(String);

impl WorkItem {
    /// 创建新的工作项
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// 获取目标标识
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for WorkItem {
    fn from(target: String) -> Self {
        Self(target)
    }
}

impl From<&str> for WorkItem {
    fn from(target: &str) -> Self {
        Self(target.to_string())
    }
}
