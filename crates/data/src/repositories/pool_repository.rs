//! Postgres-backed pool store.
//!
//! One row per aggregate: scalar columns carry everything the listing
//! views filter or sort on, the participant list rides along as JSONB,
//! and a version column guards every write. `update` is a single
//! conditional `UPDATE`, so capacity, participants and state commit
//! together or not at all.

use crate::store::{OfferPoolCount, PoolStore, StoreError, VersionedPool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use copool_domain::value_objects::coordinates::Coordinates;
use copool_domain::{OfferId, OfferSnapshot, Pool, PoolId, PoolKind, PoolState, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Haversine distance in meters between a row's point and ($1, $2) as
/// (lat, lon). 12742000 is the Earth's diameter in meters.
const DISTANCE_SQL: &str = "12742000.0 * asin(sqrt( \
     power(sin(radians(lat - $1) / 2), 2) + \
     cos(radians($1)) * cos(radians(lat)) * power(sin(radians(lon - $2) / 2), 2)))";

/// Repository for pool aggregate persistence.
#[derive(Clone)]
pub struct PgPoolStore {
    pool: Arc<PgPool>,
}

impl PgPoolStore {
    /// Creates a new PgPoolStore.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Rebuilds the aggregate from a database row.
    fn from_row(row: &PgRow) -> Result<Pool, StoreError> {
        let state_code: i16 = row.try_get("state")?;
        let state = PoolState::from_code(state_code)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown state code {state_code}")))?;

        let kind_text: String = row.try_get("kind")?;
        let kind = PoolKind::from_str(&kind_text)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown pool kind {kind_text:?}")))?;

        let participants_json: serde_json::Value = row.try_get("participants")?;
        let participants = serde_json::from_value(participants_json)
            .map_err(|e| StoreError::Corrupt(format!("participant list: {e}")))?;

        let remaining: i32 = row.try_get("remaining_capacity")?;
        let min_quota: i32 = row.try_get("offer_minimum_quota")?;
        let max_quota: i32 = row.try_get("offer_maximum_quota")?;

        Ok(Pool {
            id: PoolId(row.try_get::<Uuid, _>("id")?),
            offer: OfferSnapshot {
                offer_id: OfferId(row.try_get::<Uuid, _>("offer_id")?),
                minimum_quota: min_quota as u32,
                maximum_quota: max_quota as u32,
                seller_id: UserId(row.try_get::<Uuid, _>("offer_seller_id")?),
                name: row.try_get("offer_name")?,
                image: row.try_get("offer_image")?,
            },
            kind,
            label: row.try_get("label")?,
            location: row.try_get("location")?,
            coordinates: Coordinates::new(row.try_get("lon")?, row.try_get("lat")?),
            deadline: row.try_get("deadline")?,
            state,
            remaining_capacity: remaining as u32,
            participants,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn participants_json(pool: &Pool) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(&pool.participants)
            .map_err(|e| StoreError::Corrupt(format!("participant list: {e}")))
    }

    async fn fetch_pools(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<Pool>, StoreError> {
        let rows = query.fetch_all(self.pool.as_ref()).await?;
        rows.iter().map(Self::from_row).collect()
    }
}

#[async_trait]
impl PoolStore for PgPoolStore {
    async fn insert(&self, pool: &Pool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pools (id, offer_id, offer_minimum_quota, offer_maximum_quota,
                               offer_seller_id, offer_name, offer_image, kind, label,
                               location, lon, lat, deadline, state, remaining_capacity,
                               participants, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, 1, $17, $18)
            "#,
        )
        .bind(pool.id.0)
        .bind(pool.offer.offer_id.0)
        .bind(pool.offer.minimum_quota as i32)
        .bind(pool.offer.maximum_quota as i32)
        .bind(pool.offer.seller_id.0)
        .bind(&pool.offer.name)
        .bind(&pool.offer.image)
        .bind(pool.kind.as_str())
        .bind(&pool.label)
        .bind(&pool.location)
        .bind(pool.coordinates.lon)
        .bind(pool.coordinates.lat)
        .bind(pool.deadline)
        .bind(pool.state.code())
        .bind(pool.remaining_capacity as i32)
        .bind(Self::participants_json(pool)?)
        .bind(pool.created_at)
        .bind(pool.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn load(&self, id: PoolId) -> Result<Option<VersionedPool>, StoreError> {
        let row = sqlx::query("SELECT * FROM pools WHERE id = $1")
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(|row| {
            let version: i64 = row.try_get("version")?;
            Ok(VersionedPool {
                pool: Self::from_row(&row)?,
                version,
            })
        })
        .transpose()
    }

    async fn update(&self, pool: &Pool, expected_version: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE pools
            SET label = $1, location = $2, lon = $3, lat = $4, deadline = $5,
                state = $6, remaining_capacity = $7, participants = $8,
                version = version + 1, updated_at = NOW()
            WHERE id = $9 AND version = $10
            "#,
        )
        .bind(&pool.label)
        .bind(&pool.location)
        .bind(pool.coordinates.lon)
        .bind(pool.coordinates.lat)
        .bind(pool.deadline)
        .bind(pool.state.code())
        .bind(pool.remaining_capacity as i32)
        .bind(Self::participants_json(pool)?)
        .bind(pool.id.0)
        .bind(expected_version)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn overdue_open(&self, now: DateTime<Utc>) -> Result<Vec<Pool>, StoreError> {
        self.fetch_pools(
            sqlx::query("SELECT * FROM pools WHERE state = 0 AND deadline < $1 ORDER BY deadline")
                .bind(now),
        )
        .await
    }

    async fn closing_soon(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Pool>, StoreError> {
        self.fetch_pools(
            sqlx::query(
                "SELECT * FROM pools \
                 WHERE state = 0 AND deadline >= $1 AND deadline <= $2 \
                 ORDER BY deadline ASC",
            )
            .bind(now)
            .bind(now + window),
        )
        .await
    }

    async fn near_completion(&self, threshold: u32) -> Result<Vec<Pool>, StoreError> {
        self.fetch_pools(
            sqlx::query(
                "SELECT * FROM pools \
                 WHERE state = 0 AND remaining_capacity <= $1 \
                 ORDER BY remaining_capacity ASC",
            )
            .bind(threshold as i32),
        )
        .await
    }

    async fn offer_popularity(&self) -> Result<Vec<OfferPoolCount>, StoreError> {
        let rows = sqlx::query(
            "SELECT offer_id, COUNT(*) AS pools FROM pools \
             WHERE state >= 0 OR state = -4 \
             GROUP BY offer_id ORDER BY pools DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("pools")?;
                Ok(OfferPoolCount {
                    offer_id: OfferId(row.try_get::<Uuid, _>("offer_id")?),
                    pools: count as u64,
                })
            })
            .collect()
    }

    async fn by_membership(
        &self,
        user_id: UserId,
        manager_only: bool,
    ) -> Result<Vec<Pool>, StoreError> {
        self.fetch_pools(
            sqlx::query(
                r#"
                SELECT * FROM pools
                WHERE EXISTS (
                    SELECT 1 FROM jsonb_array_elements(participants) AS member
                    WHERE (member->>'user_id')::uuid = $1
                      AND ($2 = FALSE OR (member->>'is_manager')::boolean = TRUE)
                )
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id.0)
            .bind(manager_only),
        )
        .await
    }

    async fn by_offer(&self, offer_id: OfferId) -> Result<Vec<Pool>, StoreError> {
        self.fetch_pools(
            sqlx::query("SELECT * FROM pools WHERE offer_id = $1 ORDER BY created_at ASC")
                .bind(offer_id.0),
        )
        .await
    }

    async fn count_local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) AS total FROM pools \
             WHERE kind = 'local' AND state = 0 AND {DISTANCE_SQL} <= $3"
        );
        let row = sqlx::query(&sql)
            .bind(origin.lat)
            .bind(origin.lon)
            .bind(radius_m)
            .fetch_one(self.pool.as_ref())
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total as u64)
    }

    async fn local_near(
        &self,
        origin: Coordinates,
        radius_m: f64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Pool>, StoreError> {
        let sql = format!(
            "SELECT * FROM pools \
             WHERE kind = 'local' AND state = 0 AND {DISTANCE_SQL} <= $3 \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        self.fetch_pools(
            sqlx::query(&sql)
                .bind(origin.lat)
                .bind(origin.lon)
                .bind(radius_m)
                .bind(limit as i64)
                .bind(offset as i64),
        )
        .await
    }
}
