//! Upstream collaborator contracts and implementations.
//!
//! The engine consumes these services but does not own them: the offer
//! catalog, geocoding, the notification sink and the favorites toggle all
//! live elsewhere. Each trait failure maps to a retryable upstream error;
//! none of them ever partially mutate a pool.

mod geocoder;
mod offers;

pub use geocoder::HttpGeocoder;
pub use offers::HttpOfferDirectory;

use async_trait::async_trait;
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{OfferId, OfferSnapshot, PoolId, PoolKind, UserId};
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

/// Failure while calling a collaborator service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// One message fanned out to a single pool participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub recipient: UserId,
    pub origin: String,
    pub pool_id: PoolId,
    pub offer_image: String,
    pub pool_kind: PoolKind,
    pub pool_label: String,
    pub content: String,
}

/// Read access to the offer catalog service.
#[async_trait]
pub trait OfferDirectory: Send + Sync {
    /// Fetches the quota fields and display data for one offer.
    /// Returns `None` when the catalog does not know the offer.
    async fn get_offer(&self, offer_id: OfferId) -> Result<Option<OfferSnapshot>, UpstreamError>;
}

/// Resolves a textual address into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinates, UpstreamError>;
}

/// Delivery endpoint for participant notifications.
///
/// Send is fire-and-forget from the engine's point of view: retry policy
/// belongs to the sink, and a failed send never rolls back the state
/// transition that produced it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), UpstreamError>;
}

/// Batched lookup of a user's favorite pools.
#[async_trait]
pub trait FavoriteToggle: Send + Sync {
    /// Which of `pool_ids` the user has favorited, in one round trip.
    async fn favorites_for(
        &self,
        user_id: UserId,
        pool_ids: &[PoolId],
    ) -> Result<HashSet<PoolId>, UpstreamError>;
}

/// Notification sink that only logs, for environments without a real
/// delivery channel.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, notice: &Notice) -> Result<(), UpstreamError> {
        info!(
            recipient = %notice.recipient,
            pool = %notice.pool_id,
            content = %notice.content,
            "Notice delivered to log sink"
        );
        Ok(())
    }
}
