//! Postgres-backed notification sink.
//!
//! Persists each notice into the recipient's inbox table; a separate
//! delivery worker owns pushing them out.

use crate::providers::{Notice, NotificationSink, UpstreamError};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Notification sink writing to the `notices` table.
#[derive(Clone)]
pub struct PgNotificationSink {
    pool: Arc<PgPool>,
}

impl PgNotificationSink {
    /// Creates a new PgNotificationSink.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn send(&self, notice: &Notice) -> Result<(), UpstreamError> {
        sqlx::query(
            r#"
            INSERT INTO notices (id, recipient, origin, pool_id, offer_image,
                                 pool_kind, pool_label, content)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notice.recipient.0)
        .bind(&notice.origin)
        .bind(notice.pool_id.0)
        .bind(&notice.offer_image)
        .bind(notice.pool_kind.as_str())
        .bind(&notice.pool_label)
        .bind(&notice.content)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| UpstreamError::Request(e.to_string()))?;
        Ok(())
    }
}
