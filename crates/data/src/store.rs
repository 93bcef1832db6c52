//! Persistence contract for pool aggregates.
//!
//! The store exposes exactly one write primitive besides `insert`: a
//! compare-and-swap `update` keyed on the aggregate version. Capacity,
//! participant list and state always travel in the same write, so a pool
//! can never commit one without the others. Callers run an optimistic
//! retry loop around `load`/`update`; a version mismatch means another
//! writer won the race and the caller must re-read.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{OfferId, Pool, PoolId, UserId};
use thiserror::Error;

/// Storage-layer failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt pool record: {0}")]
    Corrupt(String),
}

/// A pool aggregate together with its optimistic-concurrency version.
#[derive(Debug, Clone)]
pub struct VersionedPool {
    pub pool: Pool,
    pub version: i64,
}

/// Aggregate pool count for one offer, used to rank offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferPoolCount {
    pub offer_id: OfferId,
    pub pools: u64,
}

/// Persistence operations over pool aggregates.
///
/// Read views never mutate; eventual consistency is acceptable for the
/// listing queries, but `load`/`update` must observe committed writes.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Persists a freshly created aggregate at version 1.
    async fn insert(&self, pool: &Pool) -> Result<(), StoreError>;

    /// Loads one aggregate with its current version.
    async fn load(&self, id: PoolId) -> Result<Option<VersionedPool>, StoreError>;

    /// Conditionally replaces the aggregate if the stored version still
    /// equals `expected_version`. Returns false when another writer won.
    async fn update(&self, pool: &Pool, expected_version: i64) -> Result<bool, StoreError>;

    /// Open pools whose deadline has already passed, oldest first.
    async fn overdue_open(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, StoreError>;

    /// Open pools closing within `window` of `now`, ascending by deadline.
    async fn closing_soon(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Pool>, StoreError>;

    /// Open pools with remaining capacity at or below `threshold`,
    /// ascending by remaining capacity.
    async fn near_completion(&self, threshold: u32) -> Result<Vec<Pool>, StoreError>;

    /// Non-cancelled pool counts grouped by offer, descending.
    async fn offer_popularity(&self) -> Result<Vec<OfferPoolCount>, StoreError>;

    /// Pools where the user participates, newest first. With
    /// `manager_only` the user must be the pool's originator.
    async fn by_membership(
        &self,
        user_id: UserId,
        manager_only: bool,
    ) -> Result<Vec<Pool>, StoreError>;

    /// Every pool referencing the offer, oldest first.
    async fn by_offer(&self, offer_id: OfferId) -> Result<Vec<Pool>, StoreError>;

    /// Number of open local-kind pools within `radius_m` of `origin`.
    async fn count_local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
    ) -> Result<u64, StoreError>;

    /// Open local-kind pools within `radius_m` of `origin`, newest first,
    /// paged by `limit`/`offset`.
    async fn local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Pool>, StoreError>;
}
