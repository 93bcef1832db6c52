use crate::enums::PoolState;
use thiserror::Error;

/// Failures raised by pure domain operations.
///
/// Every variant leaves the aggregate untouched: a failed reserve, adjust
/// or transition never partially applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("requested quantity exceeds the remaining capacity")]
    CapacityExceeded,

    #[error("user already participates in this pool")]
    AlreadyJoined,

    #[error("user is not a participant of this pool")]
    NotAParticipant,

    #[error("invalid state transition from {} to {}", .from.code(), .to.code())]
    InvalidTransition { from: PoolState, to: PoolState },
}

impl DomainError {
    /// Stable machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "capacity_exceeded",
            Self::AlreadyJoined => "already_joined",
            Self::NotAParticipant => "not_a_participant",
            Self::InvalidTransition { .. } => "invalid_transition",
        }
    }
}
