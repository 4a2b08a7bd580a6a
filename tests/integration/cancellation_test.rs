// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{items, FakeFetcher};
use fetchpool::domain::models::{FetchErrorKind, WorkItem};
use fetchpool::pipeline::{CancelReason, Pipeline, PipelineConfig, PipelineState, RunSignal};
use fetchpool::queue::rate_limiter::RateLimitMode;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_one_nanosecond_deadline_returns_promptly() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            deadline: Duration::from_nanos(1),
            ..PipelineConfig::default()
        },
        Arc::new(FakeFetcher::with_delay(Duration::from_millis(50))),
    )
    .unwrap();

    let started = Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(2), pipeline.run(items(3)))
        .await
        .expect("pipeline must not block past the grace period");

    assert!(report.results.len() <= 3);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.cancel_reason, Some(CancelReason::DeadlineElapsed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_external_cancel_truncates_results() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            workers: 2,
            rate_limit: 2,
            deadline: Duration::from_secs(30),
            ..PipelineConfig::default()
        },
        Arc::new(FakeFetcher::with_delay(Duration::from_millis(200))),
    )
    .unwrap();
    let signal = RunSignal::with_budget(Duration::from_secs(30));

    let canceller = {
        let signal = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            signal.cancel();
        })
    };

    let started = Instant::now();
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run_with_signal(items(20), signal),
    )
    .await
    .expect("cancelled pipeline must not deadlock");
    canceller.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.cancel_reason, Some(CancelReason::Requested));
    assert!(report.results.len() < 20);

    // Items dequeued before cancellation still produce exactly one result each.
    let distinct: HashSet<&WorkItem> = report.results.iter().map(|r| r.item()).collect();
    assert_eq!(distinct.len(), report.results.len());
    assert!(report
        .failures()
        .all(|r| r.error_kind() == Some(FetchErrorKind::Transport)));
}

#[tokio::test]
async fn test_cancel_before_dispatch_yields_no_results() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            limiter_mode: RateLimitMode::Enqueue,
            ..PipelineConfig::default()
        },
        Arc::new(FakeFetcher::new()),
    )
    .unwrap();
    let signal = RunSignal::with_budget(Duration::from_secs(10));
    signal.cancel();

    let report = pipeline.run_with_signal(items(10), signal).await;

    assert!(report.results.is_empty());
    assert_eq!(report.dispatched, 0);
    assert_eq!(report.state, PipelineState::Cancelled);
}
