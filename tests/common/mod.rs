//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use hashbench::compute::ComputeStep;
use hashbench::delivery::DeliveryClient;
use hashbench::error::{ComputeError, DeliveryError};
use hashbench::model::{Acknowledgment, TaskResult, WorkItem};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// bcrypt cost that keeps tests fast.
pub const CHEAP: u32 = 4;

/// Delivery client that records concurrency and fails chosen indices.
#[derive(Debug, Default)]
pub struct StubClient {
    fail_on: HashSet<usize>,
    fail_all: bool,
    latency: Duration,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    calls: AtomicUsize,
    delivered: Mutex<Vec<usize>>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on.extend(indices);
        self
    }

    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Highest number of simultaneous `submit` calls observed.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Indices acknowledged, in completion order.
    pub fn delivered(&self) -> Vec<usize> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for StubClient {
    async fn submit(&self, result: &TaskResult) -> Result<Acknowledgment, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all || self.fail_on.contains(&result.sequence_index) {
            return Err(DeliveryError::Status {
                status: 500,
                body: format!("rejected {}", result.sequence_index),
            });
        }
        self.delivered.lock().unwrap().push(result.sequence_index);
        Ok(Acknowledgment(serde_json::json!({ "status": "ok" })))
    }
}

/// Compute step that skips hashing and counts its calls.
///
/// Successful calls only are counted; `fail_at` makes that index error.
#[derive(Debug, Default)]
pub struct CountingCompute {
    fail_at: Option<usize>,
    calls: AtomicUsize,
    seen: Mutex<Vec<usize>>,
}

impl CountingCompute {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Indices computed, in call order.
    pub fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

impl ComputeStep for CountingCompute {
    fn compute(&self, item: &WorkItem) -> Result<TaskResult, ComputeError> {
        hashbench::compute::validate_difficulty(item.difficulty)?;
        if self.fail_at == Some(item.sequence_index) {
            return Err(ComputeError::InvalidDifficulty {
                difficulty: item.difficulty,
                min: item.difficulty + 1,
                max: item.difficulty + 1,
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(item.sequence_index);
        Ok(TaskResult {
            sequence_index: item.sequence_index,
            payload: format!("hash-{}", item.sequence_index),
        })
    }
}
