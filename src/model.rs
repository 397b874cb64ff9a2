//! Core data model.
//!
//! A work item is one password to hash. Its result is the encoded hash that
//! gets delivered to the accumulator. Runs produce a [`DeliveryReport`] and
//! the harness wraps that into a [`RunRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// One unit of generated input. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Position in the generated sequence, `0..count`.
    pub sequence_index: usize,
    /// Cost knob for the compute step. Higher = more CPU per item.
    pub difficulty: u32,
}

// ---------------------------------------------------------------------------
// Task Result
// ---------------------------------------------------------------------------

/// The computed artifact to persist remotely.
///
/// Only `payload` goes on the wire; `sequence_index` stays local so failures
/// can be attributed to the item that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub sequence_index: usize,
    pub payload: String,
}

/// Parsed acknowledgment body returned by the accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment(pub serde_json::Value);

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Which delivery policy drives a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Deliver each result as soon as it is computed, bounded by a limiter.
    #[default]
    Pipelined,
    /// Buffer results and deliver them as one cohort per full batch.
    Batched,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipelined => write!(f, "pipelined"),
            Self::Batched => write!(f, "batched"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Delivery outcome of one run (or one flush cohort).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Results handed to the delivery client.
    pub submitted: usize,
    pub acknowledged: usize,
    pub failed: usize,
}

impl DeliveryReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: DeliveryReport) {
        self.submitted += other.submitted;
        self.acknowledged += other.acknowledged;
        self.failed += other.failed;
    }

    /// True once every submission has either been acknowledged or failed.
    pub fn is_settled(&self) -> bool {
        self.acknowledged + self.failed == self.submitted
    }
}

/// One row of the harness log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub strategy: StrategyKind,
    pub num_items: usize,
    pub difficulty: u32,
    pub acknowledged: usize,
    pub failed: usize,
    pub elapsed_seconds: f64,
    pub started_at: DateTime<Utc>,
}
