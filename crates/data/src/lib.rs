//! Persistence and upstream-service access for the commitment engine.
//!
//! This crate provides:
//! - The `PoolStore` contract with compare-and-swap writes
//! - Postgres repositories (pools, favorites, notices)
//! - An in-memory store with identical semantics
//! - Collaborator traits and HTTP providers (offer catalog, geocoding)

/// In-memory store implementation.
pub mod memory;
/// Collaborator service contracts and providers.
pub mod providers;
/// Postgres repositories.
pub mod repositories;
/// Store contract and error types.
pub mod store;

pub use memory::MemoryPoolStore;
pub use providers::{
    FavoriteToggle, Geocoder, HttpGeocoder, HttpOfferDirectory, LogNotificationSink, Notice,
    NotificationSink, OfferDirectory, UpstreamError,
};
pub use repositories::{Database, PgFavoriteToggle, PgNotificationSink, PgPoolStore};
pub use store::{OfferPoolCount, PoolStore, StoreError, VersionedPool};
