//! Capacity ledger: the only place that moves `remaining_capacity`.
//!
//! Callers must route every capacity change through these functions so the
//! never-negative invariant cannot be bypassed. Reaching exactly zero is a
//! first-class condition; callers re-derive the capacity state (see
//! `lifecycle::sync_capacity_state`) immediately after a reserve or adjust.

use crate::entities::pool::Pool;
use crate::error::DomainError;

/// Reserves `quantity` units, returning the new remaining capacity.
///
/// Fails with `CapacityExceeded` if the pool cannot absorb the request;
/// the pool is left unchanged on failure.
pub fn reserve(pool: &mut Pool, quantity: u32) -> Result<u32, DomainError> {
    if quantity > pool.remaining_capacity {
        return Err(DomainError::CapacityExceeded);
    }
    pool.remaining_capacity -= quantity;
    Ok(pool.remaining_capacity)
}

/// Releases `quantity` units back, capped at the offer's minimum quota.
pub fn release(pool: &mut Pool, quantity: u32) -> u32 {
    pool.remaining_capacity = pool
        .remaining_capacity
        .saturating_add(quantity)
        .min(pool.offer.minimum_quota);
    pool.remaining_capacity
}

/// Replaces a reservation of `old_quantity` with `new_quantity` in one step.
///
/// Evaluated against a single read of the remaining capacity: either both
/// the release and the reserve apply, or neither does.
pub fn adjust(pool: &mut Pool, old_quantity: u32, new_quantity: u32) -> Result<u32, DomainError> {
    let released = pool
        .remaining_capacity
        .saturating_add(old_quantity)
        .min(pool.offer.minimum_quota);
    if new_quantity > released {
        return Err(DomainError::CapacityExceeded);
    }
    pool.remaining_capacity = released - new_quantity;
    Ok(pool.remaining_capacity)
}
