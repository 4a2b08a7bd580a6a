// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod test_server;

pub use fake_fetcher::FakeFetcher;
pub use test_server::start_test_server;

use fetchpool::domain::models::WorkItem;

/// 生成 n 个互不相同的工作项
pub fn items(n: usize) -> Vec<WorkItem> {
    (0..n)
        .map(|i| WorkItem::new(format!("http://fake.test/item/{}", i)))
        .collect()
}
