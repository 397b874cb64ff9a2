//! Run span helpers.
//!
//! One span per harness run; phase transitions of the dispatch state
//! machine are recorded as events on it.

use crate::model::StrategyKind;
use tracing::Span;
use uuid::Uuid;

/// Start a span for one run.
///
/// The `run.acknowledged` and `run.failed` fields are declared empty and
/// filled by [`record_run_outcome`].
pub fn start_run_span(
    strategy: StrategyKind,
    run_id: &Uuid,
    num_items: usize,
    difficulty: u32,
) -> Span {
    tracing::info_span!(
        "run.dispatch",
        "run.id" = %run_id,
        "run.strategy" = %strategy,
        "run.items" = num_items,
        "run.difficulty" = difficulty,
        "run.acknowledged" = tracing::field::Empty,
        "run.failed" = tracing::field::Empty,
    )
}

/// Record a dispatch phase transition on `span`.
pub fn record_phase_transition(span: &Span, from: &str, to: &str) {
    span.in_scope(|| {
        tracing::debug!(from = from, to = to, "phase_transition");
    });
}

/// Fill in the delivery counts once the run has drained.
pub fn record_run_outcome(span: &Span, acknowledged: usize, failed: usize) {
    span.record("run.acknowledged", acknowledged);
    span.record("run.failed", failed);
}
