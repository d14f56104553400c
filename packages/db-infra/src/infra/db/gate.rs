//! Admission control in front of the physical pool.
//!
//! The gate holds one permit per allowed connection. A caller that cannot get
//! a permit immediately joins the wait queue; when `queue_limit` is non-zero
//! and the queue is already that long, the caller is turned away instead.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::trace;

use crate::error::DbInfraError;

#[derive(Debug, Clone)]
pub(crate) struct Gate {
    permits: Arc<Semaphore>,
    waiting: Arc<AtomicU32>,
    limit: u32,
    queue_limit: u32,
}

/// Right to hold one connection. Returned to the gate on drop.
#[derive(Debug)]
pub(crate) struct Slot {
    _permit: OwnedSemaphorePermit,
}

/// Keeps the waiter count honest even if the waiting future is dropped.
struct Waiter<'a>(&'a AtomicU32);

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Gate {
    pub(crate) fn new(limit: u32, queue_limit: u32) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit as usize)),
            waiting: Arc::new(AtomicU32::new(0)),
            limit,
            queue_limit,
        }
    }

    /// Take a slot without waiting, if one is free.
    pub(crate) fn try_enter(&self) -> Option<Slot> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Slot { _permit: permit })
    }

    pub(crate) async fn enter(&self) -> Result<Slot, DbInfraError> {
        match self.permits.clone().try_acquire_owned() {
            Ok(permit) => return Ok(Slot { _permit: permit }),
            Err(TryAcquireError::Closed) => return Err(DbInfraError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let queued = self.waiting.fetch_add(1, Ordering::AcqRel);
        let _waiter = Waiter(&self.waiting);
        if self.queue_limit > 0 && queued >= self.queue_limit {
            trace!(gate = "rejected", waiting = queued, queue_limit = self.queue_limit);
            return Err(DbInfraError::QueueFull {
                limit: self.queue_limit,
            });
        }

        trace!(gate = "queued", position = queued + 1, limit = self.limit);
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DbInfraError::Closed)?;
        Ok(Slot { _permit: permit })
    }

    pub(crate) fn close(&self) {
        self.permits.close();
    }

    pub(crate) fn limit(&self) -> u32 {
        self.limit
    }

    pub(crate) fn in_use(&self) -> u32 {
        self.limit
            .saturating_sub(self.permits.available_permits() as u32)
    }

    pub(crate) fn waiting(&self) -> u32 {
        self.waiting.load(Ordering::Acquire)
    }
}
