//! Postgres-backed favorites lookup.

use crate::providers::{FavoriteToggle, UpstreamError};
use async_trait::async_trait;
use copool_domain::{PoolId, UserId};
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Favorites toggle reading the `favorites` table.
#[derive(Clone)]
pub struct PgFavoriteToggle {
    pool: Arc<PgPool>,
}

impl PgFavoriteToggle {
    /// Creates a new PgFavoriteToggle.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteToggle for PgFavoriteToggle {
    async fn favorites_for(
        &self,
        user_id: UserId,
        pool_ids: &[PoolId],
    ) -> Result<HashSet<PoolId>, UpstreamError> {
        if pool_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = pool_ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(
            "SELECT pool_id FROM favorites WHERE user_id = $1 AND pool_id = ANY($2)",
        )
        .bind(user_id.0)
        .bind(&ids)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| UpstreamError::Request(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid, _>("pool_id")
                    .map(PoolId)
                    .map_err(|e| UpstreamError::Payload(e.to_string()))
            })
            .collect()
    }
}
