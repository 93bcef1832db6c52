//! Read-only query views over pools.
//!
//! Views never mutate and tolerate slightly stale data. Every user-facing
//! listing is enriched with the caller's favorite flag through one
//! batched toggle lookup, never one call per pool.

use crate::engine::CommitmentEngine;
use crate::error::EngineError;
use chrono::Utc;
use copool_data::OfferPoolCount;
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{OfferId, Pool, PoolId, PoolState, UserId};
use rand::Rng;
use tracing::debug;

/// A pool as returned by listing views, with the caller's favorite flag.
#[derive(Debug, Clone)]
pub struct PoolView {
    pub pool: Pool,
    pub is_favorite: bool,
}

/// Participant headcount next to the offer's purchase bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantSummary {
    pub participants: usize,
    pub minimum_quota: u32,
    pub maximum_quota: u32,
}

/// Pool state plus the caller's own payment flag, if they participate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    pub state: PoolState,
    pub has_paid: Option<bool>,
}

impl CommitmentEngine {
    /// One pool with the caller's favorite flag.
    pub async fn get_pool(&self, user_id: UserId, pool_id: PoolId) -> Result<PoolView, EngineError> {
        let pool = self.pool(pool_id).await?;
        let mut views = self.enrich(user_id, vec![pool]).await?;
        Ok(views.remove(0))
    }

    /// Open pools closing within the urgency window, most urgent first.
    pub async fn list_by_urgency(&self, user_id: UserId) -> Result<Vec<PoolView>, EngineError> {
        let pools = self
            .store()
            .closing_soon(Utc::now(), self.config().urgency_window)
            .await?;
        self.enrich(user_id, pools).await
    }

    /// Open pools within a few units of their quota, closest first.
    pub async fn list_by_near_completion(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PoolView>, EngineError> {
        let pools = self
            .store()
            .near_completion(self.config().near_completion_threshold)
            .await?;
        self.enrich(user_id, pools).await
    }

    /// Open local pools around `origin`, one randomly chosen page.
    ///
    /// The page index is drawn uniformly over the valid range on every
    /// call, bounded by the matching count at call time, so repeated
    /// queries surface different pools instead of a fixed first page.
    pub async fn list_by_proximity(
        &self,
        user_id: UserId,
        origin: Coordinates,
    ) -> Result<Vec<PoolView>, EngineError> {
        let radius = self.config().proximity_radius_m;
        let page_size = self.config().proximity_page_size.max(1);

        let total = self.store().count_local_near(origin, radius).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let pages = total.div_ceil(u64::from(page_size));
        let page = {
            let mut rng = rand::rng();
            rng.random_range(0..pages)
        };
        debug!(total, pages, page, "Proximity page drawn");

        let offset = u32::try_from(page * u64::from(page_size)).unwrap_or(0);
        let pools = self
            .store()
            .local_near(origin, radius, page_size, offset)
            .await?;
        self.enrich(user_id, pools).await
    }

    /// Pools the user participates in, optionally restricted to pools
    /// they manage, newest first.
    pub async fn list_by_membership(
        &self,
        user_id: UserId,
        manager_only: bool,
    ) -> Result<Vec<PoolView>, EngineError> {
        let pools = self.store().by_membership(user_id, manager_only).await?;
        self.enrich(user_id, pools).await
    }

    /// Every pool attached to one offer, oldest first.
    pub async fn list_by_offer(
        &self,
        user_id: UserId,
        offer_id: OfferId,
    ) -> Result<Vec<PoolView>, EngineError> {
        let pools = self.store().by_offer(offer_id).await?;
        self.enrich(user_id, pools).await
    }

    /// Offers ranked by their number of non-cancelled pools.
    pub async fn offer_popularity(&self) -> Result<Vec<OfferPoolCount>, EngineError> {
        Ok(self.store().offer_popularity().await?)
    }

    /// Participant headcount and quota bounds for one pool.
    pub async fn participant_summary(
        &self,
        pool_id: PoolId,
    ) -> Result<ParticipantSummary, EngineError> {
        let pool = self.pool(pool_id).await?;
        Ok(ParticipantSummary {
            participants: pool.participants.len(),
            minimum_quota: pool.offer.minimum_quota,
            maximum_quota: pool.offer.maximum_quota,
        })
    }

    /// Pool state together with the caller's payment flag.
    pub async fn state_info(
        &self,
        pool_id: PoolId,
        user_id: UserId,
    ) -> Result<StateInfo, EngineError> {
        let pool = self.pool(pool_id).await?;
        Ok(StateInfo {
            state: pool.state,
            has_paid: pool.participant(user_id).map(|p| p.has_paid),
        })
    }

    /// Attaches the caller's favorite flags with one batched lookup.
    async fn enrich(
        &self,
        user_id: UserId,
        pools: Vec<Pool>,
    ) -> Result<Vec<PoolView>, EngineError> {
        let ids: Vec<PoolId> = pools.iter().map(|p| p.id).collect();
        let favorites = self.favorites().favorites_for(user_id, &ids).await?;
        Ok(pools
            .into_iter()
            .map(|pool| {
                let is_favorite = favorites.contains(&pool.id);
                PoolView { pool, is_favorite }
            })
            .collect())
    }
}
