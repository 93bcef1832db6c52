//! Shared fakes and fixtures for in-crate tests.

use crate::config::EngineConfig;
use crate::engine::CommitmentEngine;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use copool_data::{
    FavoriteToggle, Geocoder, MemoryPoolStore, Notice, NotificationSink, OfferDirectory,
    UpstreamError,
};
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{
    OfferId, OfferSnapshot, Participant, Pool, PoolId, PoolKind, PoolState, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
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

/// An open pool with members holding `quantities`; the first entry is the
/// manager.
pub fn pool_with_members(minimum_quota: u32, quantities: &[u32]) -> Pool {
    let now = Utc::now();
    let participants: Vec<Participant> = quantities
        .iter()
        .enumerate()
        .map(|(i, &quantity)| Participant::new(user(), quantity, i == 0, now))
        .collect();
    let committed: u32 = quantities.iter().sum();

    Pool {
        id: PoolId::new(),
        offer: offer_with_quota(minimum_quota),
        kind: PoolKind::Local,
        label: "strawberry run".to_string(),
        location: "123 Orchard Road".to_string(),
        coordinates: Coordinates::new(127.0276, 37.4979),
        deadline: now + Duration::hours(12),
        state: PoolState::Open,
        remaining_capacity: minimum_quota - committed,
        participants,
        created_at: now,
        updated_at: now,
    }
}

/// Offer directory answering from a fixed map.
pub struct StaticOffers {
    offers: HashMap<OfferId, OfferSnapshot>,
}

impl StaticOffers {
    pub fn of(offers: &[OfferSnapshot]) -> Self {
        Self {
            offers: offers
                .iter()
                .map(|o| (o.offer_id, o.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl OfferDirectory for StaticOffers {
    async fn get_offer(&self, offer_id: OfferId) -> Result<Option<OfferSnapshot>, UpstreamError> {
        Ok(self.offers.get(&offer_id).cloned())
    }
}

/// Geocoder pinning every address to one point.
pub struct FixedGeocoder(pub Coordinates);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, _address: &str) -> Result<Coordinates, UpstreamError> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct SinkState {
    sent: Vec<Notice>,
    fail_for: HashSet<UserId>,
}

/// Notification sink capturing every delivered notice, with optional
/// per-recipient failure injection.
#[derive(Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notice> {
        self.state.lock().await.sent.clone()
    }

    pub async fn fail_for(&self, user_id: UserId) {
        self.state.lock().await.fail_for.insert(user_id);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notice: &Notice) -> Result<(), UpstreamError> {
        let mut state = self.state.lock().await;
        if state.fail_for.contains(&notice.recipient) {
            return Err(UpstreamError::Request("injected delivery failure".into()));
        }
        state.sent.push(notice.clone());
        Ok(())
    }
}

/// Favorites toggle over a shared mutable set.
#[derive(Clone, Default)]
pub struct StaticFavorites {
    favorites: Arc<Mutex<HashSet<PoolId>>>,
}

impl StaticFavorites {
    pub async fn add(&self, pool_id: PoolId) {
        self.favorites.lock().await.insert(pool_id);
    }
}

#[async_trait]
impl FavoriteToggle for StaticFavorites {
    async fn favorites_for(
        &self,
        _user_id: UserId,
        pool_ids: &[PoolId],
    ) -> Result<HashSet<PoolId>, UpstreamError> {
        let favorites = self.favorites.lock().await;
        Ok(pool_ids
            .iter()
            .filter(|id| favorites.contains(id))
            .copied()
            .collect())
    }
}

/// Fully wired engine over the in-memory store.
pub struct Harness {
    pub engine: Arc<CommitmentEngine>,
    pub store: MemoryPoolStore,
    pub sink: RecordingSink,
    pub favorites: StaticFavorites,
}

pub fn harness(offers: &[OfferSnapshot]) -> Harness {
    harness_with_config(offers, EngineConfig::default())
}

pub fn harness_with_config(offers: &[OfferSnapshot], config: EngineConfig) -> Harness {
    let store = MemoryPoolStore::new();
    let sink = RecordingSink::new();
    let favorites = StaticFavorites::default();
    let engine = CommitmentEngine::new(
        Arc::new(store.clone()),
        Arc::new(StaticOffers::of(offers)),
        Arc::new(FixedGeocoder(Coordinates::new(127.0276, 37.4979))),
        Arc::new(sink.clone()),
        Arc::new(favorites.clone()),
        config,
    );
    Harness {
        engine: Arc::new(engine),
        store,
        sink,
        favorites,
    }
}
