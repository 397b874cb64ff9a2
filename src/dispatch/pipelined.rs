//! Pipelined dispatch: compute one item, hand its delivery off, move on.
//!
//! Deliveries queue on the limiter, so at most `K` are on the wire at once.
//! The dispatch loop yields after every item so queued deliveries make
//! progress even on a single-threaded runtime.

use super::tickets::Outstanding;
use super::{DispatchStrategy, Phase, settle};
use crate::compute::ComputeStep;
use crate::delivery::DeliveryClient;
use crate::error::{DeliveryError, Result};
use crate::limiter::ConcurrencyLimiter;
use crate::model::{DeliveryReport, StrategyKind};
use crate::work::WorkGenerator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

pub struct Pipelined {
    compute: Arc<dyn ComputeStep>,
    client: Arc<dyn DeliveryClient>,
    limiter: ConcurrencyLimiter,
}

impl Pipelined {
    pub fn new(
        compute: Arc<dyn ComputeStep>,
        client: Arc<dyn DeliveryClient>,
        concurrency_limit: usize,
    ) -> Result<Self> {
        Ok(Self {
            compute,
            client,
            limiter: ConcurrencyLimiter::new(concurrency_limit)?,
        })
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }
}

#[async_trait]
impl DispatchStrategy for Pipelined {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pipelined
    }

    async fn run(&mut self, work: WorkGenerator) -> Result<DeliveryReport> {
        let mut phase = Phase::Idle;
        let mut outstanding = Outstanding::new(StrategyKind::Pipelined);
        let mut tickets = Vec::new();

        phase.advance(Phase::Dispatching);
        for item in work {
            let result = match self.compute.compute(&item) {
                Ok(result) => result,
                Err(e) => {
                    let aborted = outstanding.abort().await;
                    error!(
                        index = item.sequence_index,
                        unacknowledged = aborted.failed,
                        "compute failed, aborting run: {e}"
                    );
                    return Err(e.into());
                }
            };

            let client = Arc::clone(&self.client);
            let limiter = self.limiter.clone();
            let ticket = outstanding.schedule(result.sequence_index, async move {
                let _permit = limiter
                    .acquire()
                    .await
                    .map_err(|e| DeliveryError::Task(e.to_string()))?;
                client.submit(&result).await
            });
            tickets.push(ticket);

            outstanding.reap();
            tokio::task::yield_now().await;
        }

        phase.advance(Phase::Draining);
        let report = outstanding.await_all(&tickets).await;
        phase.advance(Phase::Done);

        info!(
            submitted = report.submitted,
            acknowledged = report.acknowledged,
            failed = report.failed,
            "pipelined run drained"
        );
        settle(report)
    }
}
