//! Run harness: drive strategies over parameters and time each run.
//!
//! Every run gets its own delivery client from the harness's connector, so
//! connection pools never outlive the run they were built for. Records are
//! returned to the caller; the harness keeps no state between runs.

use crate::compute::{BcryptCompute, ComputeStep};
use crate::config::{Config, RunParams, Sweep};
use crate::delivery::{DeliveryClient, HttpDeliveryClient};
use crate::dispatch::build_strategy;
use crate::error::{Error, Result};
use crate::model::RunRecord;
use crate::telemetry::metrics;
use crate::telemetry::run::{record_run_outcome, start_run_span};
use crate::work;
use chrono::Utc;
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info};
use uuid::Uuid;

/// Builds a fresh delivery client for one run.
pub type Connector = Arc<dyn Fn() -> Result<Arc<dyn DeliveryClient>> + Send + Sync>;

pub struct RunHarness {
    compute: Arc<dyn ComputeStep>,
    connect: Connector,
}

impl RunHarness {
    pub fn new(compute: Arc<dyn ComputeStep>, connect: Connector) -> Self {
        Self { compute, connect }
    }

    /// bcrypt compute, HTTP delivery to the configured accumulator.
    pub fn http(config: &Config) -> Self {
        let base_url = config.accumulator_url.clone();
        let timeout = config.delivery_timeout;
        let connect: Connector = Arc::new(move || {
            let client = HttpDeliveryClient::new(&base_url, timeout)?;
            Ok(Arc::new(client) as Arc<dyn DeliveryClient>)
        });
        Self::new(Arc::new(BcryptCompute), connect)
    }

    /// Execute one run and time it.
    ///
    /// Fails on invalid parameters, on a compute error, or when no delivery
    /// was acknowledged.
    pub async fn run_once(&self, params: &RunParams) -> Result<RunRecord> {
        params.validate()?;
        let run_id = Uuid::new_v4();
        let span = start_run_span(params.strategy, &run_id, params.count, params.difficulty);

        async {
            let client = (self.connect)()?;
            let mut strategy = build_strategy(params, Arc::clone(&self.compute), client)?;

            let started_at = Utc::now();
            let start = Instant::now();
            let outcome = strategy
                .run(work::generate(params.count, params.difficulty))
                .await;
            let elapsed_seconds = start.elapsed().as_secs_f64();
            // Release the run's connection pool before reporting.
            drop(strategy);

            let report = outcome?;
            record_run_outcome(&tracing::Span::current(), report.acknowledged, report.failed);
            metrics::run_duration_s().record(
                elapsed_seconds,
                &[
                    KeyValue::new("strategy", params.strategy.to_string()),
                    KeyValue::new("difficulty", i64::from(params.difficulty)),
                ],
            );
            info!(
                num_items = params.count,
                acknowledged = report.acknowledged,
                failed = report.failed,
                elapsed_seconds,
                "run complete"
            );

            Ok::<_, Error>(RunRecord {
                run_id,
                strategy: params.strategy,
                num_items: params.count,
                difficulty: params.difficulty,
                acknowledged: report.acknowledged,
                failed: report.failed,
                elapsed_seconds,
                started_at,
            })
        }
        .instrument(span)
        .await
    }

    /// Execute every run of `sweep` in order, stopping at the first fatal error.
    pub async fn run_sweep(&self, sweep: &Sweep) -> Result<Vec<RunRecord>> {
        let runs = sweep.runs();
        let mut records = Vec::with_capacity(runs.len());
        for params in &runs {
            records.push(self.run_once(params).await?);
        }
        Ok(records)
    }
}
