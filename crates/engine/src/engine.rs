//! Commitment engine orchestrator.
//!
//! Every mutating operation follows the same shape: load the aggregate,
//! apply a pure domain mutation, and commit it with one conditional
//! write. A lost version race re-runs the whole cycle against a fresh
//! read, so two concurrent joins can never both consume the same
//! capacity. Notifications fan out only after the write has committed.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::notify::Notifier;
use chrono::{DateTime, Utc};
use copool_data::{FavoriteToggle, Geocoder, NotificationSink, OfferDirectory, PoolStore};
use copool_domain::{lifecycle, registry};
use copool_domain::{OfferId, Pool, PoolId, PoolKind, PoolState, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one committed mutation: the stored aggregate and the state
/// it entered, if the state changed.
pub(crate) struct MutationOutcome {
    pub pool: Pool,
    pub changed: Option<PoolState>,
}

/// Orchestrates pool operations over storage and collaborators.
pub struct CommitmentEngine {
    store: Arc<dyn PoolStore>,
    offers: Arc<dyn OfferDirectory>,
    geocoder: Arc<dyn Geocoder>,
    favorites: Arc<dyn FavoriteToggle>,
    notifier: Notifier,
    config: EngineConfig,
}

impl CommitmentEngine {
    pub fn new(
        store: Arc<dyn PoolStore>,
        offers: Arc<dyn OfferDirectory>,
        geocoder: Arc<dyn Geocoder>,
        sink: Arc<dyn NotificationSink>,
        favorites: Arc<dyn FavoriteToggle>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            offers,
            geocoder,
            favorites,
            notifier: Notifier::new(sink),
            config,
        }
    }

    pub(crate) fn store(&self) -> &dyn PoolStore {
        self.store.as_ref()
    }

    pub(crate) fn favorites(&self) -> &dyn FavoriteToggle {
        self.favorites.as_ref()
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a pool: the caller becomes its manager with an initial
    /// quantity against the offer's minimum quota.
    pub async fn create_pool(
        &self,
        user_id: UserId,
        offer_id: OfferId,
        kind: PoolKind,
        label: String,
        location: String,
        deadline: DateTime<Utc>,
        quantity: u32,
    ) -> Result<Pool, EngineError> {
        let offer = self
            .offers
            .get_offer(offer_id)
            .await?
            .ok_or(EngineError::OfferNotFound(offer_id))?;

        if quantity > offer.minimum_quota {
            return Err(copool_domain::DomainError::CapacityExceeded.into());
        }

        let coordinates = self.geocoder.resolve(&location).await?;
        let now = Utc::now();
        let remaining_capacity = offer.minimum_quota - quantity;
        let state = if remaining_capacity == 0 {
            PoolState::QuotaMet
        } else {
            PoolState::Open
        };

        let mut pool = Pool {
            id: PoolId::new(),
            offer,
            kind,
            label,
            location,
            coordinates,
            deadline,
            state,
            remaining_capacity,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        pool.participants
            .push(copool_domain::Participant::new(user_id, quantity, true, now));

        self.store.insert(&pool).await?;
        info!(
            pool = %pool.id,
            offer = %pool.offer.offer_id,
            manager = %user_id,
            quantity,
            remaining = pool.remaining_capacity,
            "Pool created"
        );
        Ok(pool)
    }

    /// Adds the caller as a participant with `quantity` units.
    pub async fn join_pool(
        &self,
        user_id: UserId,
        pool_id: PoolId,
        quantity: u32,
    ) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                Self::require_membership_phase(pool)?;
                registry::add_participant(pool, user_id, quantity, Utc::now())?;
                Ok(lifecycle::sync_capacity_state(pool))
            })
            .await?;

        info!(
            pool = %pool_id,
            user = %user_id,
            quantity,
            remaining = outcome.pool.remaining_capacity,
            "Participant joined"
        );
        self.fan_out(&outcome).await;
        Ok(outcome.pool)
    }

    /// Replaces the caller's committed quantity.
    pub async fn change_quantity(
        &self,
        user_id: UserId,
        pool_id: PoolId,
        quantity: u32,
    ) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                Self::require_membership_phase(pool)?;
                registry::change_quantity(pool, user_id, quantity)?;
                Ok(lifecycle::sync_capacity_state(pool))
            })
            .await?;

        info!(
            pool = %pool_id,
            user = %user_id,
            quantity,
            remaining = outcome.pool.remaining_capacity,
            "Quantity changed"
        );
        self.fan_out(&outcome).await;
        Ok(outcome.pool)
    }

    /// Removes the caller from the pool. A withdrawing manager forces the
    /// pool into `ManagerLeft`; everyone else just releases capacity.
    pub async fn leave_pool(&self, user_id: UserId, pool_id: PoolId) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                Self::require_membership_phase(pool)?;
                match registry::remove_participant(pool, user_id)? {
                    registry::Removal::ManagerWithdrew => {
                        Ok(lifecycle::advance(pool, PoolState::ManagerLeft)?)
                    }
                    registry::Removal::Left => Ok(lifecycle::sync_capacity_state(pool)),
                }
            })
            .await?;

        info!(
            pool = %pool_id,
            user = %user_id,
            state = outcome.pool.state.code(),
            "Participant left"
        );
        self.fan_out(&outcome).await;
        Ok(outcome.pool)
    }

    /// Applies an administrative transition (payment and shipping path).
    ///
    /// The forced-cancellation states have dedicated entry points and are
    /// rejected here; setting the current state again is a no-op.
    pub async fn set_pool_state(
        &self,
        pool_id: PoolId,
        target: PoolState,
    ) -> Result<Pool, EngineError> {
        const ADMIN_TARGETS: [PoolState; 5] = [
            PoolState::Paid,
            PoolState::PaymentFailed,
            PoolState::ShippingPending,
            PoolState::Shipping,
            PoolState::Delivered,
        ];

        let outcome = self
            .mutate(pool_id, |pool| {
                if !ADMIN_TARGETS.contains(&target) {
                    return Err(copool_domain::DomainError::InvalidTransition {
                        from: pool.state,
                        to: target,
                    }
                    .into());
                }
                Ok(lifecycle::advance(pool, target)?)
            })
            .await?;

        if outcome.changed.is_some() {
            info!(pool = %pool_id, state = target.code(), "Pool state advanced");
        }
        self.fan_out(&outcome).await;
        Ok(outcome.pool)
    }

    /// Sets the caller's payment flag on their participant record.
    pub async fn mark_paid(
        &self,
        user_id: UserId,
        pool_id: PoolId,
        paid: bool,
    ) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                Self::require_live(pool)?;
                registry::set_paid(pool, user_id, paid)?;
                Ok(None)
            })
            .await?;
        Ok(outcome.pool)
    }

    /// Marks the caller's delivery as fulfilled.
    pub async fn mark_fulfilled(
        &self,
        user_id: UserId,
        pool_id: PoolId,
    ) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                registry::set_fulfilled(pool, user_id)?;
                Ok(None)
            })
            .await?;
        Ok(outcome.pool)
    }

    /// Marks the caller as having reviewed the offer.
    pub async fn mark_reviewed(
        &self,
        user_id: UserId,
        pool_id: PoolId,
    ) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                registry::set_reviewed(pool, user_id)?;
                Ok(None)
            })
            .await?;
        Ok(outcome.pool)
    }

    /// Retires a pool on the manager's request.
    ///
    /// Manager-only: the authorization check happens here at the
    /// orchestrator boundary, not inside the domain mutation.
    pub async fn delete_pool(&self, user_id: UserId, pool_id: PoolId) -> Result<Pool, EngineError> {
        let outcome = self
            .mutate(pool_id, |pool| {
                let is_manager = pool
                    .manager()
                    .is_some_and(|manager| manager.user_id == user_id);
                if !is_manager {
                    return Err(EngineError::Unauthorized);
                }
                Ok(lifecycle::advance(pool, PoolState::ManagerLeft)?)
            })
            .await?;

        info!(pool = %pool_id, manager = %user_id, "Pool deleted by manager");
        self.fan_out(&outcome).await;
        Ok(outcome.pool)
    }

    /// Cascades `OfferWithdrawn` to every live pool of the offer and
    /// notifies each pool's participants. Returns how many pools were
    /// cancelled.
    pub async fn delete_pools_for_offer(&self, offer_id: OfferId) -> Result<usize, EngineError> {
        let pools = self.store.by_offer(offer_id).await?;
        let mut cancelled = 0;

        for pool in pools {
            if pool.state.is_terminal() {
                continue;
            }
            match self
                .mutate(pool.id, |p| {
                    Ok(lifecycle::advance(p, PoolState::OfferWithdrawn)?)
                })
                .await
            {
                Ok(outcome) => {
                    cancelled += 1;
                    self.fan_out(&outcome).await;
                }
                // Lost a race against another terminal transition; the
                // pool is already retired.
                Err(EngineError::Domain(
                    copool_domain::DomainError::InvalidTransition { .. },
                )) => {}
                Err(e) => return Err(e),
            }
        }

        info!(offer = %offer_id, cancelled, "Offer withdrawal cascaded");
        Ok(cancelled)
    }

    /// Expires every open pool whose deadline has passed.
    ///
    /// Idempotent: pools already expired are not matched again, so a
    /// rerun of the sweep is harmless.
    pub async fn expire_overdue_pools(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let pools = self.store.overdue_open(now).await?;
        let mut expired = 0;

        for pool in pools {
            match self
                .mutate(pool.id, |p| {
                    if p.deadline >= now {
                        // Deadline moved since the scan; leave it alone.
                        return Ok(None);
                    }
                    Ok(lifecycle::advance(p, PoolState::Expired)?)
                })
                .await
            {
                Ok(outcome) => {
                    if outcome.changed.is_some() {
                        expired += 1;
                    }
                    self.fan_out(&outcome).await;
                }
                Err(EngineError::Domain(
                    copool_domain::DomainError::InvalidTransition { .. },
                )) => {}
                Err(e) => return Err(e),
            }
        }

        if expired > 0 {
            info!(expired, "Expired overdue pools");
        } else {
            debug!("No overdue pools to expire");
        }
        Ok(expired)
    }

    /// Loads one pool aggregate.
    pub async fn pool(&self, pool_id: PoolId) -> Result<Pool, EngineError> {
        Ok(self
            .store
            .load(pool_id)
            .await?
            .ok_or(EngineError::PoolNotFound(pool_id))?
            .pool)
    }

    /// Optimistic read-mutate-write cycle with a bounded retry budget.
    ///
    /// The closure must be pure against the aggregate: it is re-run from
    /// a fresh read whenever the conditional write loses the version
    /// race. Closure failures abort immediately with the aggregate
    /// untouched.
    async fn mutate<F>(&self, pool_id: PoolId, mut apply: F) -> Result<MutationOutcome, EngineError>
    where
        F: FnMut(&mut Pool) -> Result<Option<PoolState>, EngineError>,
    {
        for attempt in 0..self.config.cas_retry_budget {
            let versioned = self
                .store
                .load(pool_id)
                .await?
                .ok_or(EngineError::PoolNotFound(pool_id))?;

            let mut pool = versioned.pool;
            let changed = apply(&mut pool)?;
            pool.updated_at = Utc::now();

            if self.store.update(&pool, versioned.version).await? {
                debug_assert!(
                    pool.remaining_capacity
                        == pool.offer.minimum_quota.saturating_sub(pool.committed_quantity())
                );
                return Ok(MutationOutcome { pool, changed });
            }
            debug!(pool = %pool_id, attempt, "Lost version race, retrying");
        }

        warn!(pool = %pool_id, budget = self.config.cas_retry_budget, "Retry budget exhausted");
        Err(EngineError::Contention)
    }

    async fn fan_out(&self, outcome: &MutationOutcome) {
        if let Some(state) = outcome.changed {
            self.notifier.pool_state_changed(&outcome.pool, state).await;
        }
    }

    fn require_membership_phase(pool: &Pool) -> Result<(), EngineError> {
        if pool.state.accepts_membership_changes() {
            Ok(())
        } else {
            Err(EngineError::PoolClosed(pool.state))
        }
    }

    fn require_live(pool: &Pool) -> Result<(), EngineError> {
        if pool.state.is_terminal() {
            Err(EngineError::PoolClosed(pool.state))
        } else {
            Ok(())
        }
    }
}
