//! Admission gate: a counting semaphore with blocking and fail-fast acquisition.
//!
//! Two gates exist in a running service: a request-level gate (fail-fast, so
//! overload turns into 503 instead of a queue) and a download-level gate
//! (blocking, so total outbound fetches stay bounded across all requests).
//! Capacity is fixed at construction; slots are returned when the
//! `AdmissionSlot` is dropped, on every exit path.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Returned by `try_acquire` when all slots are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admission gate is busy")]
pub struct Busy;

/// Returned by `acquire` once the gate has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admission gate is closed")]
pub struct Closed;

/// Capacity-bounded slot pool shared between tasks.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots (0 is clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free. May be stale as soon as it is returned.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Wait until a slot is free and take it. No fairness beyond the
    /// semaphore's own queueing.
    pub async fn acquire(&self) -> Result<AdmissionSlot, Closed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| Closed)?;
        Ok(AdmissionSlot { _permit: permit })
    }

    /// Refuse new slots on every clone of this gate. Waiters are woken with
    /// `Closed`; slots already held stay valid until dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Take a slot if one is free, otherwise fail immediately with `Busy`.
    pub fn try_acquire(&self) -> Result<AdmissionSlot, Busy> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(AdmissionSlot { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => Err(Busy),
        }
    }
}

/// One unit of gate capacity. Dropping it releases the slot.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionSlot {
    /// Release the slot now instead of at end of scope.
    pub fn release(self) {}
}
