//! Error types for hashbench.
//!
//! Compute failures are fatal to a run. Delivery failures are per-item and
//! get counted into the run's [`DeliveryReport`](crate::model::DeliveryReport).

use thiserror::Error;

/// The compute step rejected its input.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("difficulty {difficulty} outside accepted range {min}..={max}")]
    InvalidDifficulty { difficulty: u32, min: u32, max: u32 },

    #[error("hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// One submission to the accumulator did not produce an acknowledgment.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("accumulator answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unparseable acknowledgment: {0}")]
    InvalidAck(#[from] serde_json::Error),

    #[error("delivery task ended abnormally: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("compute failed: {0}")]
    Compute(#[from] ComputeError),

    #[error("all {failed} deliveries failed")]
    AllDeliveriesFailed { failed: usize },

    #[error("invalid run parameters: {0}")]
    InvalidParams(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
