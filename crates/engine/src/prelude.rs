//! Convenient imports for engine consumers.

pub use crate::config::EngineConfig;
pub use crate::engine::CommitmentEngine;
pub use crate::error::EngineError;
pub use crate::notify::Notifier;
pub use crate::sweeper::ExpirySweeper;
pub use crate::views::{ParticipantSummary, PoolView, StateInfo};

pub use copool_data::{
    Database, FavoriteToggle, Geocoder, LogNotificationSink, MemoryPoolStore, Notice,
    NotificationSink, OfferDirectory, PoolStore,
};
pub use copool_domain::{
    OfferId, OfferSnapshot, Participant, Pool, PoolId, PoolKind, PoolState, UserId,
};
