// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::start_test_server;
use fetchpool::config::settings::FetcherSettings;
use fetchpool::domain::models::{FetchErrorKind, FetchResult, WorkItem};
use fetchpool::engines::reqwest_engine::ReqwestFetcher;
use fetchpool::pipeline::{Pipeline, PipelineConfig, PipelineState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

fn pipeline() -> Pipeline {
    let fetcher = ReqwestFetcher::new(&FetcherSettings::default()).unwrap();
    Pipeline::new(
        PipelineConfig {
            workers: 5,
            rate_limit: 5,
            deadline: Duration::from_secs(10),
            ..PipelineConfig::default()
        },
        Arc::new(fetcher),
    )
    .unwrap()
}

#[tokio::test]
async fn test_three_reachable_targets_all_succeed() {
    let base = start_test_server().await;
    let submitted = vec![
        WorkItem::new(format!("{}/bytes/128", base)),
        WorkItem::new(format!("{}/bytes/2048", base)),
        WorkItem::new(format!("{}/ping", base)),
    ];

    let report = pipeline().run(submitted.clone()).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 3);

    let bytes: HashMap<&WorkItem, usize> = report
        .results
        .iter()
        .map(|r| match r {
            FetchResult::Success { item, bytes, .. } => (item, *bytes),
            other => panic!("expected success, got {}", other),
        })
        .collect();
    assert_eq!(bytes[&submitted[0]], 128);
    assert_eq!(bytes[&submitted[1]], 2048);
    assert_eq!(bytes[&submitted[2]], r#"{"message":"pong"}"#.len());
}

#[tokio::test]
async fn test_unreachable_and_malformed_targets_fail_per_item() {
    let base = start_test_server().await;
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let submitted = vec![
        WorkItem::new(format!("{}/bytes/16", base)),
        WorkItem::new(format!("http://{}/", closed_addr)),
        WorkItem::new("::not-a-url::"),
    ];

    let report = pipeline().run(submitted).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 3);

    let mut kinds: Vec<FetchErrorKind> = report.failures().filter_map(|r| r.error_kind()).collect();
    kinds.sort_by_key(|k| k.to_string());
    assert_eq!(
        kinds,
        vec![FetchErrorKind::RequestConstruction, FetchErrorKind::Transport]
    );
    assert_eq!(report.successes().count(), 1);
    assert!(report
        .failures()
        .all(|r| r.to_string().starts_with("Error: ")));
}
