use crate::entities::participant::Participant;
use crate::enums::{PoolKind, PoolState};
use crate::value_objects::coordinates::Coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl PoolId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PoolId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Denormalized snapshot of the offer being pooled, taken at pool creation.
/// The offer catalog itself is owned by a collaborator service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub offer_id: OfferId,
    pub minimum_quota: u32,
    pub maximum_quota: u32,
    pub seller_id: UserId,
    pub name: String,
    pub image: String,
}

/// One group-buy instance tied to an offer.
///
/// Invariant: `remaining_capacity` always equals
/// `offer.minimum_quota - sum(participant quantities)` and never goes
/// negative. Mutations go through the ledger and registry modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub offer: OfferSnapshot,
    pub kind: PoolKind,
    pub label: String,
    pub location: String,
    pub coordinates: Coordinates,
    pub deadline: DateTime<Utc>,
    pub state: PoolState,
    pub remaining_capacity: u32,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pool {
    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participant_mut(&mut self, user_id: UserId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn manager(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_manager)
    }

    /// Sum of all active participant quantities.
    pub fn committed_quantity(&self) -> u32 {
        self.participants.iter().map(|p| p.quantity).sum()
    }
}
