//! Reusable admission gate bounding simultaneous operations.

use forge_error::{ExecutorError, ExecutorErrorKind, ForgeResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate admitting at most `capacity` holders at once.
///
/// Waiters are admitted in arrival order. The gate knows nothing about the
/// work it guards, so image, text and speech calls can share one instance.
///
/// # Examples
///
/// ```
/// use forge_executor::AdmissionGate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = AdmissionGate::new(2);
/// let first = gate.admit().await?;
/// let _second = gate.admit().await?;
/// assert_eq!(gate.in_flight(), 2);
/// assert!(gate.try_admit().is_none());
///
/// drop(first);
/// assert_eq!(gate.available(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a slot. The slot is released when the permit drops.
    ///
    /// # Errors
    ///
    /// Returns `GateClosed` if the gate was shut down.
    pub async fn admit(&self) -> ForgeResult<AdmissionPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::new(ExecutorErrorKind::GateClosed))?;
        Ok(self.track(permit))
    }

    /// Take a slot only if one is free right now.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    /// Refuse all current and future waiters.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> AdmissionPermit {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        AdmissionPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// RAII guard for an admitted slot.
///
/// Dropping the guard returns the slot to the gate, whether the guarded
/// work succeeded, failed or was cancelled.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
