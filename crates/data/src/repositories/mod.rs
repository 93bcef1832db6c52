//! Repository implementations for database persistence.
//!
//! This module provides the Postgres-backed store and collaborator
//! implementations plus the connection wrapper that hands them out.

mod favorite_repository;
mod notice_repository;
mod pool_repository;

pub use favorite_repository::PgFavoriteToggle;
pub use notice_repository::PgNotificationSink;
pub use pool_repository::PgPoolStore;

use sqlx::PgPool;
use std::sync::Arc;

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Creates a new Database wrapper from a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Creates a new database connection from a connection string.
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a PgPoolStore instance.
    #[must_use]
    pub fn pools(&self) -> PgPoolStore {
        PgPoolStore::new(self.pool.clone())
    }

    /// Creates a PgFavoriteToggle instance.
    #[must_use]
    pub fn favorites(&self) -> PgFavoriteToggle {
        PgFavoriteToggle::new(self.pool.clone())
    }

    /// Creates a PgNotificationSink instance.
    #[must_use]
    pub fn notices(&self) -> PgNotificationSink {
        PgNotificationSink::new(self.pool.clone())
    }

    /// Runs database migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
