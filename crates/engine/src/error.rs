use copool_data::{StoreError, UpstreamError};
use copool_domain::{DomainError, OfferId, PoolId, PoolState};
use thiserror::Error;

/// Failures surfaced by commitment engine operations.
///
/// Every variant carries a stable kind (`kind()`) next to its
/// human-readable message. No operation partially commits: a failure
/// means the aggregate is exactly as it was before the call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("offer {0} not found")]
    OfferNotFound(OfferId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("pool no longer accepts participant changes (state {})", .0.code())]
    PoolClosed(PoolState),

    #[error("caller is not the pool manager")]
    Unauthorized,

    #[error("collaborator unavailable: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("pool update lost the version race too many times; retry")]
    Contention,
}

impl EngineError {
    /// Stable machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PoolNotFound(_) | Self::OfferNotFound(_) => "not_found",
            Self::Domain(e) => e.kind(),
            Self::PoolClosed(_) => "invalid_transition",
            Self::Unauthorized => "unauthorized",
            Self::Upstream(_) => "upstream_unavailable",
            Self::Storage(_) | Self::Contention => "upstream_unavailable",
        }
    }

    /// Whether the caller may safely retry the exact same call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Storage(_) | Self::Contention)
    }
}
