// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了抓取流水线的核心数据：
/// - 工作项（work_item）：一次抓取的目标
/// - 抓取结果（fetch_result）：成功或失败的结果标签
pub mod fetch_result;
pub mod work_item;

pub use fetch_result::{FetchErrorKind, FetchResult};
pub use work_item::WorkItem;
