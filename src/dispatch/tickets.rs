//! Outstanding-delivery tracking.
//!
//! [`Outstanding::schedule`] issues a [`Ticket`] immediately and runs the
//! delivery as a tokio task. [`Outstanding::await_all`] waits until every
//! ticket it is handed has resolved. The set is private to the strategy
//! that created it; dropping it aborts whatever is still in flight.

use crate::error::DeliveryError;
use crate::model::{Acknowledgment, DeliveryReport, StrategyKind};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, warn};

type Delivery = Result<Acknowledgment, DeliveryError>;

/// Handle for one submitted delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub sequence_index: usize,
    task: Id,
}

/// Where a ticket's delivery stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Pending,
    Acknowledged,
    Failed,
}

pub struct Outstanding {
    tasks: JoinSet<Delivery>,
    states: HashMap<Id, (usize, TicketState)>,
    report: DeliveryReport,
    labels: [KeyValue; 1],
    acknowledged: Counter<u64>,
    failed: Counter<u64>,
}

impl Outstanding {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            tasks: JoinSet::new(),
            states: HashMap::new(),
            report: DeliveryReport::default(),
            labels: [KeyValue::new("strategy", strategy.to_string())],
            acknowledged: metrics::deliveries_acknowledged(),
            failed: metrics::deliveries_failed(),
        }
    }

    /// Start `delivery` for the result at `sequence_index`. Returns at once.
    pub fn schedule<F>(&mut self, sequence_index: usize, delivery: F) -> Ticket
    where
        F: Future<Output = Delivery> + Send + 'static,
    {
        let handle = self.tasks.spawn(delivery);
        let task = handle.id();
        self.states
            .insert(task, (sequence_index, TicketState::Pending));
        self.report.submitted += 1;
        Ticket {
            sequence_index,
            task,
        }
    }

    /// Current state of `ticket`. Tickets from another set read as failed.
    pub fn state(&self, ticket: &Ticket) -> TicketState {
        self.states
            .get(&ticket.task)
            .map(|&(_, state)| state)
            .unwrap_or(TicketState::Failed)
    }

    /// Resolve any deliveries that already finished, without waiting.
    pub fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.resolve(joined);
        }
    }

    /// Wait until every ticket in `tickets` is acknowledged or failed.
    pub async fn await_all(&mut self, tickets: &[Ticket]) -> DeliveryReport {
        for ticket in tickets {
            while self.state(ticket) == TicketState::Pending {
                match self.tasks.join_next_with_id().await {
                    Some(joined) => self.resolve(joined),
                    None => break,
                }
            }
        }
        self.report
    }

    /// Abort everything still in flight. Aborted tickets count as failed.
    pub async fn abort(&mut self) -> DeliveryReport {
        self.tasks.abort_all();
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.resolve(joined);
        }
        debug_assert!(self.report.is_settled());
        self.report
    }

    fn resolve(&mut self, joined: Result<(Id, Delivery), JoinError>) {
        match joined {
            Ok((id, Ok(_ack))) => self.acknowledge(id),
            Ok((id, Err(error))) => self.fail(id, error),
            Err(join_error) => {
                let id = join_error.id();
                self.fail(id, DeliveryError::Task(join_error.to_string()));
            }
        }
    }

    fn mark(&mut self, id: Id, state: TicketState) -> Option<usize> {
        let entry = self.states.get_mut(&id)?;
        entry.1 = state;
        Some(entry.0)
    }

    fn acknowledge(&mut self, id: Id) {
        let index = self.mark(id, TicketState::Acknowledged);
        self.report.acknowledged += 1;
        self.acknowledged.add(1, &self.labels);
        debug!(index, "ticket acknowledged");
    }

    fn fail(&mut self, id: Id, error: DeliveryError) {
        let index = self.mark(id, TicketState::Failed);
        self.report.failed += 1;
        self.failed.add(1, &self.labels);
        warn!(index, %error, "delivery failed");
    }
}
