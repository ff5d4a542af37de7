use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Ticket number. Issued as `1..=capacity`.
pub type UnitId = u32;

/// Wall-clock time of day in the inventory's time zone.
pub type TimeOfDay = NaiveTime;

/// One caller's ask. Signed so that non-positive counts can be rejected
/// rather than being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client_name: String,
    pub requested: i64,
}

impl BookingRequest {
    pub fn new(client_name: impl Into<String>, requested: i64) -> Self {
        Self {
            client_name: client_name.into(),
            requested,
        }
    }
}

/// Terminal state of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    ValidationError,
    ClosedWindow,
    CapacityTimeout,
    Cancelled,
    InternalError,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// The structured outcome of one request. Built exactly once, never mutated.
///
/// `allocated` is sorted and duplicate-free on success and always empty
/// otherwise; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    id: Ulid,
    client_name: String,
    requested: i64,
    allocated: Vec<UnitId>,
    outcome: Outcome,
    message: String,
}

impl BookingResult {
    pub fn success(client_name: impl Into<String>, requested: i64, mut allocated: Vec<UnitId>) -> Self {
        allocated.sort_unstable();
        allocated.dedup();
        let message = format!("successfully allocated {} tickets", allocated.len());
        Self {
            id: Ulid::new(),
            client_name: client_name.into(),
            requested,
            allocated,
            outcome: Outcome::Success,
            message,
        }
    }

    /// A rejected request. `outcome` must not be `Success`.
    pub fn failure(
        client_name: impl Into<String>,
        requested: i64,
        outcome: Outcome,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(!outcome.is_success(), "failure built with Success outcome");
        Self {
            id: Ulid::new(),
            client_name: client_name.into(),
            requested,
            allocated: Vec::new(),
            outcome,
            message: message.into(),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn requested(&self) -> i64 {
        self.requested
    }

    pub fn allocated(&self) -> &[UnitId] {
        &self.allocated
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
