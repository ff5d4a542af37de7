use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};

/// Counting admission over the inventory's budget.
///
/// Backed by tokio's `Semaphore`, which hands out permits in request order:
/// a waiting `acquire(5)` at the head of the queue holds back a later
/// `acquire(1)` even when one permit is free. Every wait is bounded by the
/// caller's timeout, so the queue never blocks anyone indefinitely.
///
/// The semaphore parks free permits on the head waiter while it waits, so
/// its `available_permits` undercounts. `granted` tracks only budget held
/// by completed acquires (and commits), and is what `available` reports.
pub struct CapacityGate {
    permits: Semaphore,
    capacity: u32,
    granted: AtomicU32,
}

/// The bounded wait for budget expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl CapacityGate {
    pub fn new(capacity: u32) -> Self {
        Self {
            permits: Semaphore::new(capacity as usize),
            capacity,
            granted: AtomicU32::new(0),
        }
    }

    /// Budget not held by any granted or committed reservation.
    pub fn available(&self) -> u32 {
        self.capacity - self.granted.load(Ordering::Acquire)
    }

    /// Reserve `count` units of budget in one step, waiting at most `timeout`.
    /// On timeout any partially assigned permits go back to the gate.
    pub async fn acquire(&self, count: u32, timeout: Duration) -> Result<Reservation<'_>, TimedOut> {
        debug_assert!(count > 0, "gate acquire with zero count");
        match tokio::time::timeout(timeout, self.permits.acquire_many(count)).await {
            Ok(Ok(permit)) => {
                self.granted.fetch_add(count, Ordering::AcqRel);
                Ok(Reservation {
                    permit: Some(permit),
                    granted: &self.granted,
                    count,
                })
            }
            // The semaphore is private and never closed.
            Ok(Err(_)) => unreachable!(),
            Err(_) => Err(TimedOut),
        }
    }
}

/// Budget held by one request. Dropping it releases exactly `count`.
#[must_use = "dropping a reservation releases it"]
#[derive(Debug)]
pub struct Reservation<'a> {
    permit: Option<SemaphorePermit<'a>>,
    granted: &'a AtomicU32,
    count: u32,
}

impl Reservation<'_> {
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Keep the budget consumed for good.
    pub fn commit(mut self) {
        if let Some(permit) = self.permit.take() {
            permit.forget();
        }
    }

    /// Hand the whole reservation back to the gate.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.granted.fetch_sub(self.count, Ordering::AcqRel);
            drop(permit);
        }
    }
}
