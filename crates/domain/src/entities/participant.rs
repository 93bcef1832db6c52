use crate::entities::pool::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

/// A user's commitment of a quantity within a pool.
///
/// Participants are owned by their pool and never referenced outside it,
/// except by `user_id` for notification addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    pub quantity: u32,
    pub has_paid: bool,
    pub is_fulfilled: bool,
    pub is_manager: bool,
    pub has_reviewed: bool,
}

impl Participant {
    pub fn new(user_id: UserId, quantity: u32, is_manager: bool, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: ParticipantId(Uuid::new_v4()),
            user_id,
            joined_at,
            quantity,
            has_paid: false,
            is_fulfilled: false,
            is_manager,
            has_reviewed: false,
        }
    }
}
