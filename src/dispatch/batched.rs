//! Batched dispatch: buffer results, deliver them one cohort at a time.
//!
//! [`Batcher::save`] flushes automatically whenever the batch fills. The
//! trailing partial batch is only delivered by an explicit flush, which
//! [`Batcher::finish`] performs. A batcher dropped with unflushed results
//! logs a warning.

use super::tickets::Outstanding;
use super::{DispatchStrategy, Phase, settle};
use crate::compute::ComputeStep;
use crate::delivery::DeliveryClient;
use crate::error::{Error, Result};
use crate::model::{DeliveryReport, StrategyKind, TaskResult};
use crate::telemetry::metrics;
use crate::work::WorkGenerator;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Largest cohort a batcher accepts. Every result of a cohort is in flight
/// at once, so this also bounds simultaneous deliveries.
pub const MAX_BATCH_SIZE: usize = 1 << 20;

/// Why a cohort was flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The batch reached capacity inside `save`.
    Automatic,
    /// The caller asked for it.
    Explicit,
}

impl FlushTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Explicit => "explicit",
        }
    }
}

/// Flush bookkeeping for one batcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub automatic: usize,
    pub explicit: usize,
    /// Size of every cohort, in flush order.
    pub cohort_sizes: Vec<usize>,
}

/// Bounded in-memory batch in front of a delivery client.
pub struct Batcher {
    client: Arc<dyn DeliveryClient>,
    capacity: usize,
    batch: Vec<TaskResult>,
    report: DeliveryReport,
    stats: FlushStats,
}

impl Batcher {
    pub fn new(client: Arc<dyn DeliveryClient>, capacity: usize) -> Result<Self> {
        check_batch_size(capacity)?;
        Ok(Self {
            client,
            capacity,
            batch: Vec::new(),
            report: DeliveryReport::default(),
            stats: FlushStats::default(),
        })
    }

    /// Append `result`; flush before returning if the batch is now full.
    ///
    /// Returns the cohort's report when a flush happened.
    pub async fn save(&mut self, result: TaskResult) -> Option<DeliveryReport> {
        self.batch.push(result);
        if self.batch.len() >= self.capacity {
            Some(self.flush_cohort(FlushTrigger::Automatic).await)
        } else {
            None
        }
    }

    /// Deliver whatever is buffered and wait for the whole cohort to resolve.
    pub async fn flush(&mut self) -> DeliveryReport {
        self.flush_cohort(FlushTrigger::Explicit).await
    }

    /// Flush the trailing partial batch and hand back the totals.
    pub async fn finish(mut self) -> (DeliveryReport, FlushStats) {
        self.flush().await;
        (self.report, std::mem::take(&mut self.stats))
    }

    /// Drop buffered results without delivering them.
    pub fn discard(&mut self) -> usize {
        let dropped = self.batch.len();
        self.batch.clear();
        dropped
    }

    /// Results buffered and not yet flushed.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn report(&self) -> DeliveryReport {
        self.report
    }

    async fn flush_cohort(&mut self, trigger: FlushTrigger) -> DeliveryReport {
        // Swap the batch out first so saves can resume against an empty one.
        let cohort = std::mem::take(&mut self.batch);
        let size = cohort.len();

        let mut outstanding = Outstanding::new(StrategyKind::Batched);
        let tickets: Vec<_> = cohort
            .into_iter()
            .map(|result| {
                let client = Arc::clone(&self.client);
                outstanding.schedule(result.sequence_index, async move {
                    client.submit(&result).await
                })
            })
            .collect();
        let cohort_report = outstanding.await_all(&tickets).await;

        match trigger {
            FlushTrigger::Automatic => self.stats.automatic += 1,
            FlushTrigger::Explicit => self.stats.explicit += 1,
        }
        self.stats.cohort_sizes.push(size);
        self.report.absorb(cohort_report);
        metrics::batch_flushes().add(1, &[KeyValue::new("trigger", trigger.as_str())]);

        debug!(
            trigger = trigger.as_str(),
            size,
            acknowledged = cohort_report.acknowledged,
            failed = cohort_report.failed,
            "cohort flushed"
        );
        cohort_report
    }
}

fn check_batch_size(size: usize) -> Result<()> {
    if (1..=MAX_BATCH_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(Error::InvalidParams(format!(
            "batch size must be in 1..={MAX_BATCH_SIZE}, got {size}"
        )))
    }
}

impl Drop for Batcher {
    fn drop(&mut self) {
        if !self.batch.is_empty() {
            warn!(
                unflushed = self.batch.len(),
                "batcher dropped without a final flush, results lost"
            );
        }
    }
}

/// Strategy wrapper that feeds a fresh [`Batcher`] per run.
pub struct Batched {
    compute: Arc<dyn ComputeStep>,
    client: Arc<dyn DeliveryClient>,
    batch_size: usize,
    last_flushes: Option<FlushStats>,
}

impl Batched {
    pub fn new(
        compute: Arc<dyn ComputeStep>,
        client: Arc<dyn DeliveryClient>,
        batch_size: usize,
    ) -> Result<Self> {
        check_batch_size(batch_size)?;
        Ok(Self {
            compute,
            client,
            batch_size,
            last_flushes: None,
        })
    }

    /// Flush bookkeeping of the most recent completed run.
    pub fn last_flushes(&self) -> Option<&FlushStats> {
        self.last_flushes.as_ref()
    }
}

#[async_trait]
impl DispatchStrategy for Batched {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Batched
    }

    async fn run(&mut self, work: WorkGenerator) -> Result<DeliveryReport> {
        let mut phase = Phase::Idle;
        let mut batcher = Batcher::new(Arc::clone(&self.client), self.batch_size)?;

        phase.advance(Phase::Dispatching);
        for item in work {
            let result = match self.compute.compute(&item) {
                Ok(result) => result,
                Err(e) => {
                    let dropped = batcher.discard();
                    error!(
                        index = item.sequence_index,
                        dropped,
                        "compute failed, aborting run: {e}"
                    );
                    return Err(e.into());
                }
            };
            batcher.save(result).await;
        }

        phase.advance(Phase::Draining);
        let (report, stats) = batcher.finish().await;
        phase.advance(Phase::Done);

        info!(
            submitted = report.submitted,
            acknowledged = report.acknowledged,
            failed = report.failed,
            automatic_flushes = stats.automatic,
            "batched run drained"
        );
        self.last_flushes = Some(stats);
        settle(report)
    }
}
