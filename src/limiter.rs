//! Admission gate bounding simultaneous in-flight deliveries.
//!
//! Built on `tokio::sync::Semaphore`, which queues waiters in FIFO order,
//! so no caller starves while demand is bounded. Capacity is returned when
//! the [`Permit`] drops, which covers early returns, `?` and panics alike.

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A counting gate with fixed capacity `K`.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Proof of admission. Releases its slot on drop.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    /// Give the slot back now rather than at end of scope.
    pub fn release(self) {}
}

/// Largest capacity the underlying semaphore can represent.
pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

impl ConcurrencyLimiter {
    /// Create a gate admitting at most `capacity` holders at once.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidParams(
                "concurrency limit must be at least 1".to_string(),
            ));
        }
        if capacity > MAX_CAPACITY {
            return Err(Error::InvalidParams(format!(
                "concurrency limit {capacity} exceeds maximum {MAX_CAPACITY}"
            )));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait until fewer than `capacity` holders are admitted, then admit the caller.
    pub async fn acquire(&self) -> Result<Permit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| Error::Other(format!("limiter closed: {e}")))?;
        Ok(Permit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Holders currently admitted.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}
