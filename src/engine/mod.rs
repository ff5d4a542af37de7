mod error;
mod gate;
mod pool;
mod window;

pub use error::EngineError;
pub use gate::{CapacityGate, Reservation, TimedOut};
pub use pool::UnitPool;
pub use window::{is_open, Clock, FixedClock, SystemClock};

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::limits::*;
use crate::model::*;
use crate::observability;

/// Fixed-capacity ticket inventory shared by every requester.
///
/// Two independently synchronized structures: the gate counts budget, the
/// pool holds ticket numbers. Outside the short stretch between a granted
/// acquire and its pool takes, `gate.available() == pool.len()`.
pub struct Inventory {
    capacity: u32,
    gate: CapacityGate,
    pool: UnitPool,
    acquire_timeout: Duration,
}

impl Inventory {
    pub fn new(capacity: u32, acquire_timeout: Duration) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(EngineError::LimitExceeded("capacity must be at least 1"));
        }
        if capacity > MAX_CAPACITY {
            return Err(EngineError::LimitExceeded("capacity too large"));
        }
        let inventory = Self {
            capacity,
            gate: CapacityGate::new(capacity),
            pool: UnitPool::with_units(1..=capacity),
            acquire_timeout,
        };
        metrics::gauge!(observability::TICKETS_REMAINING).set(capacity as f64);
        Ok(inventory)
    }

    /// Gate and pool deliberately out of step, for exercising the rollback path.
    #[cfg(test)]
    pub(crate) fn with_pool(
        capacity: u32,
        units: impl IntoIterator<Item = UnitId>,
        acquire_timeout: Duration,
    ) -> Self {
        Self {
            capacity,
            gate: CapacityGate::new(capacity),
            pool: UnitPool::with_units(units),
            acquire_timeout,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Snapshot of the unreserved budget.
    pub fn remaining_capacity(&self) -> u32 {
        self.gate.available()
    }

    /// Sorted ticket numbers still in the pool.
    pub fn available_units(&self) -> Vec<UnitId> {
        self.pool.snapshot()
    }

    pub async fn book_tickets(&self, client_name: &str, requested: i64, now: TimeOfDay) -> BookingResult {
        let request = BookingRequest::new(client_name, requested);
        self.book_tickets_cancellable(&request, now, &CancellationToken::new())
            .await
    }

    /// Run one request to a terminal result. Never panics on domain failures;
    /// every failure leaves gate and pool as they were before the call.
    pub async fn book_tickets_cancellable(
        &self,
        request: &BookingRequest,
        now: TimeOfDay,
        cancel: &CancellationToken,
    ) -> BookingResult {
        let result = match self.try_book(request, now, cancel).await {
            Ok(units) => {
                info!(
                    client = %request.client_name,
                    requested = request.requested,
                    ?units,
                    "booking confirmed"
                );
                metrics::counter!(observability::TICKETS_ALLOCATED_TOTAL).increment(units.len() as u64);
                BookingResult::success(request.client_name.clone(), request.requested, units)
            }
            Err(e) => {
                match &e {
                    EngineError::InvalidCount(_) | EngineError::LimitExceeded(_) | EngineError::Closed(_) => {
                        debug!(client = %request.client_name, requested = request.requested, "booking rejected: {e}");
                    }
                    EngineError::CapacityTimeout { available } => {
                        warn!(client = %request.client_name, requested = request.requested, available, "capacity wait timed out");
                    }
                    EngineError::Cancelled => {
                        warn!(client = %request.client_name, requested = request.requested, "booking cancelled");
                    }
                    EngineError::Internal(reason) => {
                        error!(client = %request.client_name, requested = request.requested, "booking rolled back: {reason}");
                    }
                }
                BookingResult::failure(request.client_name.clone(), request.requested, e.outcome(), e.to_string())
            }
        };
        metrics::counter!(
            observability::BOOKINGS_TOTAL,
            "outcome" => observability::outcome_label(result.outcome())
        )
        .increment(1);
        metrics::gauge!(observability::TICKETS_REMAINING).set(self.remaining_capacity() as f64);
        result
    }

    /// validate → window → gate → pool. Returns sorted ticket numbers.
    pub async fn try_book(
        &self,
        request: &BookingRequest,
        now: TimeOfDay,
        cancel: &CancellationToken,
    ) -> Result<Vec<UnitId>, EngineError> {
        if request.requested <= 0 {
            return Err(EngineError::InvalidCount(request.requested));
        }
        if request.client_name.len() > MAX_CLIENT_NAME_LEN {
            return Err(EngineError::LimitExceeded("client name too long"));
        }
        if !is_open(now) {
            return Err(EngineError::Closed(now));
        }

        // More than the whole inventory can never be granted; skip the wait.
        let count = match u32::try_from(request.requested) {
            Ok(n) if n <= self.capacity => n,
            _ => {
                return Err(EngineError::CapacityTimeout {
                    available: self.remaining_capacity(),
                });
            }
        };

        let wait_start = Instant::now();
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            acquired = self.gate.acquire(count, self.acquire_timeout) => acquired,
        };
        metrics::histogram!(observability::ACQUIRE_WAIT_SECONDS).record(wait_start.elapsed().as_secs_f64());

        let Ok(reservation) = acquired else {
            return Err(EngineError::CapacityTimeout {
                available: self.remaining_capacity(),
            });
        };

        let mut taken = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if cancel.is_cancelled() {
                self.roll_back(reservation, taken);
                return Err(EngineError::Cancelled);
            }
            match self.pool.take() {
                Some(id) => taken.push(id),
                None => {
                    let got = taken.len();
                    self.roll_back(reservation, taken);
                    return Err(EngineError::Internal(format!(
                        "ticket pool ran dry after {got} of {count} units while budget was granted"
                    )));
                }
            }
        }

        reservation.commit();
        taken.sort_unstable();
        Ok(taken)
    }

    /// Undo a partial allocation: units back to the pool first, then the
    /// full reservation back to the gate, so a new grantee never sees more
    /// budget than there are free units.
    fn roll_back(&self, reservation: Reservation<'_>, taken: Vec<UnitId>) {
        debug!(units = taken.len(), budget = reservation.count(), "rolling back partial allocation");
        for id in taken {
            self.pool.put(id);
        }
        reservation.release();
        metrics::counter!(observability::ROLLBACKS_TOTAL).increment(1);
    }
}
