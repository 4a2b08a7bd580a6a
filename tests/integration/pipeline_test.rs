// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{items, FakeFetcher};
use fetchpool::domain::models::{FetchErrorKind, WorkItem};
use fetchpool::pipeline::{Pipeline, PipelineConfig, PipelineState};
use fetchpool::queue::rate_limiter::RateLimitMode;
use fetchpool::utils::errors::PipelineError;
use fetchpool::workers::FaultIsolation;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn config(workers: usize, rate_limit: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        rate_limit,
        deadline: Duration::from_secs(10),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_every_item_yields_exactly_one_result() {
    let fetcher = Arc::new(FakeFetcher::new());
    let pipeline = Pipeline::new(config(4, 3), fetcher.clone()).unwrap();
    let submitted = items(20);

    let report = pipeline.run(submitted.clone()).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 20);
    assert_eq!(report.submitted, 20);
    assert_eq!(report.dispatched, 20);
    assert!(report.cancel_reason.is_none());
    assert_eq!(fetcher.calls(), 20);

    let returned: HashSet<&WorkItem> = report.results.iter().map(|r| r.item()).collect();
    let expected: HashSet<&WorkItem> = submitted.iter().collect();
    assert_eq!(returned, expected);
    assert!(report.results.iter().all(|r| r.is_success()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_execution_mode_bounds_concurrently_active_fetches() {
    let fetcher = Arc::new(FakeFetcher::with_delay(Duration::from_millis(5)));
    let pipeline = Pipeline::new(config(8, 2), fetcher.clone()).unwrap();

    let report = pipeline.run(items(50)).await;

    assert_eq!(report.results.len(), 50);
    assert!(fetcher.peak() <= 2, "peak active fetches was {}", fetcher.peak());
    assert!(report.peak_in_flight <= 2);
    assert_eq!(fetcher.active(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_three_items_with_two_permits_run_at_most_two_at_once() {
    let fetcher = Arc::new(FakeFetcher::with_delay(Duration::from_millis(50)));
    let pipeline = Pipeline::new(config(3, 2), fetcher.clone()).unwrap();

    let report = pipeline.run(items(3)).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 3);
    // All three workers dequeue at once; only two may fetch together.
    assert_eq!(fetcher.peak(), 2);
    assert_eq!(report.peak_in_flight, 2);
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_enqueue_mode_holds_one_permit_per_enqueue() {
    let fetcher = Arc::new(FakeFetcher::with_delay(Duration::from_millis(5)));
    let pipeline = Pipeline::new(
        PipelineConfig {
            limiter_mode: RateLimitMode::Enqueue,
            ..config(3, 2)
        },
        fetcher.clone(),
    )
    .unwrap();

    let report = pipeline.run(items(3)).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 3);
    // The dispatcher releases each permit right after its enqueue.
    assert_eq!(report.peak_in_flight, 1);
    // Fetches themselves are not gated in this mode.
    assert!(fetcher.peak() <= 3);
}

#[tokio::test]
async fn test_per_item_isolation_keeps_worker_running_after_fault() {
    let fetcher = Arc::new(FakeFetcher::new());
    let pipeline = Pipeline::new(config(1, 1), fetcher).unwrap();
    let submitted = vec![
        WorkItem::new("http://fake.test/a"),
        WorkItem::new("http://fake.test/panic"),
        WorkItem::new("http://fake.test/b"),
        WorkItem::new("http://fake.test/c"),
    ];

    let report = pipeline.run(submitted).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.faults, 1);
    let faulted: Vec<_> = report.failures().collect();
    assert_eq!(faulted.len(), 1);
    assert_eq!(faulted[0].error_kind(), Some(FetchErrorKind::UnexpectedFault));
    assert!(faulted[0]
        .to_string()
        .contains("fake fetcher exploded on http://fake.test/panic"));
    // The permit held during the panicking fetch was released.
    assert_eq!(report.successes().count(), 3);
}

#[tokio::test]
async fn test_per_worker_isolation_abandons_faulting_worker() {
    let fetcher = Arc::new(FakeFetcher::new());
    let pipeline = Pipeline::new(
        PipelineConfig {
            fault_isolation: FaultIsolation::PerWorker,
            ..config(1, 1)
        },
        fetcher.clone(),
    )
    .unwrap();
    let submitted = vec![
        WorkItem::new("http://fake.test/panic"),
        WorkItem::new("http://fake.test/a"),
        WorkItem::new("http://fake.test/b"),
    ];

    let report = pipeline.run(submitted).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].error_kind(), Some(FetchErrorKind::UnexpectedFault));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_failures_are_reported_alongside_successes() {
    let fetcher = Arc::new(FakeFetcher::new());
    let pipeline = Pipeline::new(config(3, 3), fetcher).unwrap();
    let submitted = vec![
        WorkItem::new("http://fake.test/ok"),
        WorkItem::new("http://fake.test/fail"),
    ];

    let report = pipeline.run(submitted).await;

    assert_eq!(report.state, PipelineState::Completed);
    let lines: HashSet<String> = report.results.iter().map(|r| r.to_string()).collect();
    assert!(lines.contains("Fetched 19 bytes from http://fake.test/ok"));
    assert!(lines.contains("Error: error fetching http://fake.test/fail: connection refused"));
}

#[tokio::test]
async fn test_empty_input_completes_without_results() {
    let pipeline = Pipeline::new(config(5, 5), Arc::new(FakeFetcher::new())).unwrap();

    let report = pipeline.run(Vec::new()).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert!(report.results.is_empty());
    assert_eq!(report.dispatched, 0);
}

#[tokio::test]
async fn test_small_queues_still_deliver_every_result() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            job_queue_capacity: Some(1),
            result_queue_capacity: Some(1),
            ..config(2, 2)
        },
        Arc::new(FakeFetcher::with_delay(Duration::from_millis(1))),
    )
    .unwrap();

    let report = pipeline.run(items(25)).await;

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(report.results.len(), 25);
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = Pipeline::new(config(0, 1), Arc::new(FakeFetcher::new()));
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));

    let result = Pipeline::new(config(1, 0), Arc::new(FakeFetcher::new()));
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}
