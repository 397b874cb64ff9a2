//! Typed configuration.
//!
//! Process settings come from environment variables and are loaded once at
//! startup, failing fast on malformed values. Run parameters come from the
//! CLI or a TOML sweep file (see [`sweep`]).

pub mod sweep;

use crate::dispatch::batched::MAX_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::limiter::MAX_CAPACITY;
use crate::model::StrategyKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use sweep::{Sweep, SweepPoint};

/// Accumulator base URL used when `ACCUMULATOR_URL` is unset.
pub const DEFAULT_ACCUMULATOR_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub accumulator_url: String,
    pub delivery_timeout: Option<Duration>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let accumulator_url = std::env::var("ACCUMULATOR_URL")
            .unwrap_or_else(|_| DEFAULT_ACCUMULATOR_URL.to_string());
        if !(accumulator_url.starts_with("http://") || accumulator_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "ACCUMULATOR_URL must be an http(s) URL, got {accumulator_url}"
            )));
        }

        let delivery_timeout = match std::env::var("DELIVERY_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            accumulator_url,
            delivery_timeout,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::Config(format!(
            "DELIVERY_TIMEOUT_SECS must be a positive integer, got {raw:?}"
        ))),
    }
}

/// Parameters for one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub strategy: StrategyKind,
    pub count: usize,
    pub difficulty: u32,
    /// In-flight delivery bound. Pipelined only.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    /// Cohort size. Batched only.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

pub(crate) fn default_concurrency_limit() -> usize {
    100
}

pub(crate) fn default_batch_size() -> usize {
    100
}

impl RunParams {
    pub fn pipelined(count: usize, difficulty: u32, concurrency_limit: usize) -> Self {
        Self {
            strategy: StrategyKind::Pipelined,
            count,
            difficulty,
            concurrency_limit,
            batch_size: default_batch_size(),
        }
    }

    pub fn batched(count: usize, difficulty: u32, batch_size: usize) -> Self {
        Self {
            strategy: StrategyKind::Batched,
            count,
            difficulty,
            concurrency_limit: default_concurrency_limit(),
            batch_size,
        }
    }

    /// Reject bounds that would stall or never flush.
    ///
    /// Difficulty is left to the compute step, which fails the run with a
    /// compute error before any delivery.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CAPACITY).contains(&self.concurrency_limit) {
            return Err(Error::InvalidParams(format!(
                "concurrency_limit must be in 1..={MAX_CAPACITY}, got {}",
                self.concurrency_limit
            )));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(Error::InvalidParams(format!(
                "batch_size must be in 1..={MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        Ok(())
    }
}
