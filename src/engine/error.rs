use crate::model::{Outcome, TimeOfDay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidCount(i64),
    Closed(TimeOfDay),
    CapacityTimeout { available: u32 },
    Cancelled,
    Internal(String),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Outcome tag reported to callers for this failure.
    pub fn outcome(&self) -> Outcome {
        match self {
            EngineError::InvalidCount(_) | EngineError::LimitExceeded(_) => Outcome::ValidationError,
            EngineError::Closed(_) => Outcome::ClosedWindow,
            EngineError::CapacityTimeout { .. } => Outcome::CapacityTimeout,
            EngineError::Cancelled => Outcome::Cancelled,
            EngineError::Internal(_) => Outcome::InternalError,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidCount(n) => {
                write!(f, "invalid ticket count ({n}): count must be >=1")
            }
            EngineError::Closed(now) => write!(
                f,
                "booking is unavailable from {} to {}; current time: {}",
                crate::limits::CLOSED_FROM.format("%H:%M"),
                crate::limits::CLOSED_TO.format("%H:%M"),
                now.format("%H:%M")
            ),
            EngineError::CapacityTimeout { available } => {
                write!(f, "not enough free tickets; available now: {available}")
            }
            EngineError::Cancelled => write!(f, "operation cancelled; please try again"),
            EngineError::Internal(reason) => write!(f, "internal error: {reason}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
