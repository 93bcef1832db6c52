//! In-memory pool store.
//!
//! Backs the engine's tests and the CLI demo paths with the same
//! compare-and-swap semantics as the Postgres store.

use crate::store::{OfferPoolCount, PoolStore, StoreError, VersionedPool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{OfferId, Pool, PoolId, PoolKind, PoolState, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Pool store holding every aggregate in process memory.
#[derive(Clone, Default)]
pub struct MemoryPoolStore {
    pools: Arc<RwLock<HashMap<PoolId, (Pool, i64)>>>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored aggregates.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
    async fn insert(&self, pool: &Pool) -> Result<(), StoreError> {
        self.pools
            .write()
            .await
            .insert(pool.id, (pool.clone(), 1));
        Ok(())
    }

    async fn load(&self, id: PoolId) -> Result<Option<VersionedPool>, StoreError> {
        Ok(self.pools.read().await.get(&id).map(|(pool, version)| {
            VersionedPool {
                pool: pool.clone(),
                version: *version,
            }
        }))
    }

    async fn update(&self, pool: &Pool, expected_version: i64) -> Result<bool, StoreError> {
        let mut pools = self.pools.write().await;
        match pools.get_mut(&pool.id) {
            Some((stored, version)) if *version == expected_version => {
                *stored = pool.clone();
                *version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn overdue_open(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, StoreError> {
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| p.state == PoolState::Open && p.deadline < now)
            .cloned()
            .collect();
        pools.sort_by_key(|p| p.deadline);
        Ok(pools)
    }

    async fn closing_soon(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Pool>, StoreError> {
        let horizon = now + window;
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| {
                p.state == PoolState::Open && p.deadline >= now && p.deadline <= horizon
            })
            .cloned()
            .collect();
        pools.sort_by_key(|p| p.deadline);
        Ok(pools)
    }

    async fn near_completion(&self, threshold: u32) -> Result<Vec<Pool>, StoreError> {
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| p.state == PoolState::Open && p.remaining_capacity <= threshold)
            .cloned()
            .collect();
        pools.sort_by_key(|p| p.remaining_capacity);
        Ok(pools)
    }

    async fn offer_popularity(&self) -> Result<Vec<OfferPoolCount>, StoreError> {
        let mut counts: HashMap<OfferId, u64> = HashMap::new();
        for (pool, _) in self.pools.read().await.values() {
            if !pool.state.is_cancelled() {
                *counts.entry(pool.offer.offer_id).or_default() += 1;
            }
        }
        let mut ranked: Vec<OfferPoolCount> = counts
            .into_iter()
            .map(|(offer_id, pools)| OfferPoolCount { offer_id, pools })
            .collect();
        ranked.sort_by(|a, b| b.pools.cmp(&a.pools));
        Ok(ranked)
    }

    async fn by_membership(
        &self,
        user_id: UserId,
        manager_only: bool,
    ) -> Result<Vec<Pool>, StoreError> {
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| {
                p.participants
                    .iter()
                    .any(|m| m.user_id == user_id && (!manager_only || m.is_manager))
            })
            .cloned()
            .collect();
        pools.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pools)
    }

    async fn by_offer(&self, offer_id: OfferId) -> Result<Vec<Pool>, StoreError> {
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| p.offer.offer_id == offer_id)
            .cloned()
            .collect();
        pools.sort_by_key(|p| p.created_at);
        Ok(pools)
    }

    async fn count_local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
    ) -> Result<u64, StoreError> {
        Ok(self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| within_local_radius(p, origin, radius_m))
            .count() as u64)
    }

    async fn local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Pool>, StoreError> {
        let mut pools: Vec<Pool> = self
            .pools
            .read()
            .await
            .values()
            .map(|(pool, _)| pool)
            .filter(|p| within_local_radius(p, origin, radius_m))
            .cloned()
            .collect();
        pools.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pools
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

fn within_local_radius(pool: &Pool, origin: Coordinates, radius_m: f64) -> bool {
    pool.kind == PoolKind::Local
        && pool.state == PoolState::Open
        && pool.coordinates.distance_meters(&origin) <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use copool_domain::{OfferSnapshot, Participant};
    use uuid::Uuid;

    fn pool(kind: PoolKind, state: PoolState, lon: f64, lat: f64) -> Pool {
        let now = Utc::now();
        Pool {
            id: PoolId::new(),
            offer: OfferSnapshot {
                offer_id: OfferId(Uuid::new_v4()),
                minimum_quota: 5,
                maximum_quota: 5,
                seller_id: UserId(Uuid::new_v4()),
                name: "offer".to_string(),
                image: String::new(),
            },
            kind,
            label: "pool".to_string(),
            location: "somewhere".to_string(),
            coordinates: Coordinates::new(lon, lat),
            deadline: now + Duration::hours(6),
            state,
            remaining_capacity: 5,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_cas_update_detects_stale_version() {
        let store = MemoryPoolStore::new();
        let p = pool(PoolKind::Standard, PoolState::Open, 127.0, 37.5);
        store.insert(&p).await.unwrap();

        let loaded = store.load(p.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);

        assert!(store.update(&p, 1).await.unwrap());
        // Stale writer loses.
        assert!(!store.update(&p, 1).await.unwrap());
        assert_eq!(store.load(p.id).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_local_near_filters_kind_state_and_radius() {
        let store = MemoryPoolStore::new();
        let origin = Coordinates::new(127.0276, 37.4979);

        let near_local = pool(PoolKind::Local, PoolState::Open, 127.0280, 37.4981);
        let near_standard = pool(PoolKind::Standard, PoolState::Open, 127.0280, 37.4981);
        let near_closed = pool(PoolKind::Local, PoolState::QuotaMet, 127.0280, 37.4981);
        let far_local = pool(PoolKind::Local, PoolState::Open, 129.0756, 35.1796);

        for p in [&near_local, &near_standard, &near_closed, &far_local] {
            store.insert(p).await.unwrap();
        }

        let found = store.local_near(origin, 5_000.0, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, near_local.id);
        assert_eq!(store.count_local_near(origin, 5_000.0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_membership_view_respects_manager_filter() {
        let store = MemoryPoolStore::new();
        let alice = UserId(Uuid::new_v4());

        let mut managed = pool(PoolKind::Standard, PoolState::Open, 127.0, 37.5);
        managed
            .participants
            .push(Participant::new(alice, 2, true, managed.created_at));

        let mut joined = pool(PoolKind::Standard, PoolState::Open, 127.0, 37.5);
        joined
            .participants
            .push(Participant::new(alice, 1, false, joined.created_at));

        store.insert(&managed).await.unwrap();
        store.insert(&joined).await.unwrap();

        assert_eq!(store.by_membership(alice, false).await.unwrap().len(), 2);
        let managed_only = store.by_membership(alice, true).await.unwrap();
        assert_eq!(managed_only.len(), 1);
        assert_eq!(managed_only[0].id, managed.id);
    }

    #[tokio::test]
    async fn test_popularity_excludes_cancelled_pools() {
        let store = MemoryPoolStore::new();
        let offer = OfferId(Uuid::new_v4());

        for state in [PoolState::Open, PoolState::Paid, PoolState::ManagerLeft] {
            let mut p = pool(PoolKind::Standard, state, 127.0, 37.5);
            p.offer.offer_id = offer;
            store.insert(&p).await.unwrap();
        }

        let ranked = store.offer_popularity().await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].pools, 2);
    }

    #[tokio::test]
    async fn test_overdue_open_ignores_future_and_settled() {
        let store = MemoryPoolStore::new();
        let now = Utc::now();

        let mut overdue = pool(PoolKind::Standard, PoolState::Open, 127.0, 37.5);
        overdue.deadline = now - Duration::hours(1);
        let mut settled = pool(PoolKind::Standard, PoolState::Expired, 127.0, 37.5);
        settled.deadline = now - Duration::hours(1);
        let fresh = pool(PoolKind::Standard, PoolState::Open, 127.0, 37.5);

        for p in [&overdue, &settled, &fresh] {
            store.insert(p).await.unwrap();
        }

        let found = store.overdue_open(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, overdue.id);
    }
}
