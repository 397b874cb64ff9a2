//! # hashbench
//!
//! Bounded-concurrency dispatch harness. Hashes generated passwords with
//! bcrypt and delivers each hash to an HTTP accumulator, either pipelined
//! behind a concurrency limiter or in batched cohorts.
//!
//! Provides the dispatch core (generation, compute, delivery, limiter,
//! strategies), a run harness with timing, a reference accumulator, and
//! OpenTelemetry observability.

pub mod accumulator;
pub mod compute;
pub mod config;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod harness;
pub mod limiter;
pub mod model;
pub mod telemetry;
pub mod work;
