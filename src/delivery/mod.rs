//! Delivery of computed results to the accumulator.
//!
//! A [`DeliveryClient`] performs one logical call per result: send it,
//! wait for the acknowledgment. Clients are shared across every concurrent
//! delivery of a run, so implementations must not keep per-call mutable
//! state outside of whatever connection pool they wrap.

pub mod http;

use crate::error::DeliveryError;
use crate::model::{Acknowledgment, TaskResult};
use async_trait::async_trait;

pub use http::HttpDeliveryClient;

/// Submits one result and awaits its acknowledgment.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn submit(&self, result: &TaskResult) -> Result<Acknowledgment, DeliveryError>;
}
