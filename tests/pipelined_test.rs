//! Integration tests for the pipelined strategy.

mod common;

use common::{CHEAP, CountingCompute, StubClient};
use hashbench::dispatch::{DispatchStrategy, Pipelined};
use hashbench::error::Error;
use hashbench::work::generate;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn pipelined(
    compute: &Arc<CountingCompute>,
    client: &Arc<StubClient>,
    limit: usize,
) -> Pipelined {
    Pipelined::new(compute.clone(), client.clone(), limit).unwrap()
}

#[tokio::test]
async fn every_item_is_computed_and_acknowledged() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new());
    let mut strategy = pipelined(&compute, &client, 4);

    let report = strategy.run(generate(25, CHEAP)).await.unwrap();

    assert_eq!(report.submitted, 25);
    assert_eq!(report.acknowledged, 25);
    assert_eq!(report.failed, 0);
    assert_eq!(compute.calls(), 25);
    assert_eq!(client.calls(), 25);
    assert_eq!(compute.seen(), (0..25).collect::<Vec<_>>());

    let mut delivered = client.delivered();
    delivered.sort_unstable();
    assert_eq!(delivered, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn limit_of_one_serializes_deliveries() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new().with_latency(Duration::from_millis(5)));
    let mut strategy = pipelined(&compute, &client, 1);

    let report = strategy.run(generate(3, CHEAP)).await.unwrap();

    assert_eq!(report.acknowledged, 3);
    assert_eq!(client.high_water(), 1);
}

#[tokio::test]
async fn deliveries_overlap_up_to_the_limit() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new().with_latency(Duration::from_millis(20)));
    let mut strategy = pipelined(&compute, &client, 4);

    let report = strategy.run(generate(10, CHEAP)).await.unwrap();

    assert_eq!(report.acknowledged, 10);
    assert_eq!(client.high_water(), 4);
    assert_eq!(strategy.limiter().in_flight(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn high_water_mark_never_exceeds_limit(
        count in 0usize..60,
        limit in 1usize..10,
        latency_ms in 0u64..4,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let compute = Arc::new(CountingCompute::default());
        let client = Arc::new(
            StubClient::new().with_latency(Duration::from_millis(latency_ms)),
        );
        let mut strategy = pipelined(&compute, &client, limit);

        let report = runtime
            .block_on(strategy.run(generate(count, CHEAP)))
            .unwrap();

        prop_assert!(client.high_water() <= limit);
        prop_assert_eq!(report.acknowledged, count);
        prop_assert_eq!(report.failed, 0);
        prop_assert_eq!(compute.calls(), count);
    }
}

#[tokio::test]
async fn single_failure_is_counted_not_fatal() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new().failing_on([2]));
    let mut strategy = pipelined(&compute, &client, 2);

    let report = strategy.run(generate(5, CHEAP)).await.unwrap();

    assert_eq!(report.submitted, 5);
    assert_eq!(report.acknowledged, 4);
    assert_eq!(report.failed, 1);
    assert!(!client.delivered().contains(&2));
}

#[tokio::test]
async fn run_fails_when_every_delivery_fails() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new().failing_all());
    let mut strategy = pipelined(&compute, &client, 3);

    let err = strategy.run(generate(5, CHEAP)).await.unwrap_err();

    assert!(matches!(err, Error::AllDeliveriesFailed { failed: 5 }));
    assert_eq!(client.calls(), 5);
}

#[tokio::test]
async fn invalid_difficulty_aborts_before_any_delivery() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new());
    let mut strategy = pipelined(&compute, &client, 3);

    let err = strategy.run(generate(5, 2)).await.unwrap_err();

    assert!(matches!(err, Error::Compute(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn empty_run_completes_with_zero_counts() {
    let compute = Arc::new(CountingCompute::default());
    let client = Arc::new(StubClient::new());
    let mut strategy = pipelined(&compute, &client, 3);

    let report = strategy.run(generate(0, CHEAP)).await.unwrap();

    assert_eq!(report, Default::default());
    assert_eq!(compute.calls(), 0);
}

#[tokio::test]
async fn compute_error_mid_run_stops_further_deliveries() {
    let compute = Arc::new(CountingCompute::failing_at(3));
    let client = Arc::new(StubClient::new().with_latency(Duration::from_millis(50)));
    let mut strategy = pipelined(&compute, &client, 1);

    let err = strategy.run(generate(8, CHEAP)).await.unwrap_err();

    assert!(matches!(err, Error::Compute(_)));
    assert_eq!(compute.calls(), 3);
    assert_eq!(compute.seen(), vec![0, 1, 2]);

    // Only results computed before the error ever reached the client, and
    // the in-flight one was aborted rather than left running.
    let calls_at_error = client.calls();
    assert!(calls_at_error <= 3);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(client.calls(), calls_at_error);
    assert!(client.delivered().iter().all(|&i| i < 3));
    assert!(client.delivered().len() < 3);
}
