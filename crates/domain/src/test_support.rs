//! Shared fixtures for in-crate tests.

use crate::entities::participant::Participant;
use crate::entities::pool::{OfferId, OfferSnapshot, Pool, PoolId, UserId};
use crate::enums::{PoolKind, PoolState};
use crate::value_objects::coordinates::Coordinates;
use chrono::{Duration, Utc};
use uuid::Uuid;

pub fn user() -> UserId {
    UserId(Uuid::new_v4())
}

pub fn offer_with_quota(minimum_quota: u32) -> OfferSnapshot {
    OfferSnapshot {
        offer_id: OfferId(Uuid::new_v4()),
        minimum_quota,
        maximum_quota: minimum_quota,
        seller_id: user(),
        name: "boxed strawberries".to_string(),
        image: "https://img.example/strawberries.jpg".to_string(),
    }
}

/// An open pool with the full quota still available and no participants.
pub fn pool_with_quota(minimum_quota: u32) -> Pool {
    let now = Utc::now();
    Pool {
        id: PoolId::new(),
        offer: offer_with_quota(minimum_quota),
        kind: PoolKind::Local,
        label: "strawberry run".to_string(),
        location: "123 Orchard Road".to_string(),
        coordinates: Coordinates::new(127.0276, 37.4979),
        deadline: now + Duration::hours(12),
        state: PoolState::Open,
        remaining_capacity: minimum_quota,
        participants: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// An open pool whose manager already committed `manager_quantity` units.
pub fn pool_with_manager(minimum_quota: u32, manager_quantity: u32) -> Pool {
    let mut pool = pool_with_quota(minimum_quota);
    pool.participants
        .push(Participant::new(user(), manager_quantity, true, pool.created_at));
    pool.remaining_capacity = minimum_quota - manager_quantity;
    pool
}
