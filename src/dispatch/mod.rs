//! Dispatch strategies: generate → compute → deliver, then wait for every
//! delivery to resolve.
//!
//! Both strategies walk the same phases. A run is only `Done` once no
//! ticket is outstanding.

pub mod batched;
pub mod pipelined;
pub mod tickets;

use crate::compute::ComputeStep;
use crate::config::RunParams;
use crate::delivery::DeliveryClient;
use crate::error::{Error, Result};
use crate::model::{DeliveryReport, StrategyKind};
use crate::telemetry::run::record_phase_transition;
use crate::work::WorkGenerator;
use async_trait::async_trait;
use std::sync::Arc;

pub use batched::{Batched, Batcher, FlushStats};
pub use pipelined::Pipelined;
pub use tickets::{Outstanding, Ticket, TicketState};

/// One interchangeable delivery policy.
#[async_trait]
pub trait DispatchStrategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Compute and deliver every item of `work`.
    ///
    /// Returns once every submitted delivery has resolved. Fails fast on a
    /// compute error; delivery errors are counted, not propagated, unless
    /// nothing at all was acknowledged.
    async fn run(&mut self, work: WorkGenerator) -> Result<DeliveryReport>;
}

/// Build the strategy selected by `params`.
pub fn build_strategy(
    params: &RunParams,
    compute: Arc<dyn ComputeStep>,
    client: Arc<dyn DeliveryClient>,
) -> Result<Box<dyn DispatchStrategy>> {
    params.validate()?;
    let strategy: Box<dyn DispatchStrategy> = match params.strategy {
        StrategyKind::Pipelined => Box::new(Pipelined::new(
            compute,
            client,
            params.concurrency_limit,
        )?),
        StrategyKind::Batched => Box::new(Batched::new(compute, client, params.batch_size)?),
    };
    Ok(strategy)
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    Draining,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }

    /// Move to `next`, recording the transition on the current span.
    pub(crate) fn advance(&mut self, next: Phase) {
        record_phase_transition(&tracing::Span::current(), self.as_str(), next.as_str());
        *self = next;
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn a drained report into the run's outcome.
///
/// A run that submitted something and got no acknowledgment back fails as a
/// whole; any partial failure is reported in the counts.
pub(crate) fn settle(report: DeliveryReport) -> Result<DeliveryReport> {
    if report.submitted > 0 && report.acknowledged == 0 {
        return Err(Error::AllDeliveriesFailed {
            failed: report.failed,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_fails_only_when_nothing_was_acknowledged() {
        let all_failed = DeliveryReport {
            submitted: 3,
            acknowledged: 0,
            failed: 3,
        };
        assert!(matches!(
            settle(all_failed),
            Err(Error::AllDeliveriesFailed { failed: 3 })
        ));

        let partial = DeliveryReport {
            submitted: 3,
            acknowledged: 1,
            failed: 2,
        };
        assert_eq!(settle(partial).unwrap(), partial);

        assert_eq!(
            settle(DeliveryReport::default()).unwrap(),
            DeliveryReport::default()
        );
    }

    #[test]
    fn phase_advances_in_order() {
        let mut phase = Phase::Idle;
        phase.advance(Phase::Dispatching);
        phase.advance(Phase::Draining);
        phase.advance(Phase::Done);
        assert_eq!(phase, Phase::Done);
        assert_eq!(phase.to_string(), "done");
    }
}
